use crate::bsp;
use crate::bsp::pac::{CLOCKS, ROSC, XOSC};
use crate::bsp::XOSC_CRYSTAL_FREQ;
use crate::external_power::RunModeRestore;
use crate::sleep_controller::SleepError;
use fugit::{HertzU32, RateExtU32};
use rp2040_hal::clocks::{ClocksManager, StoppableClock};
use rp2040_hal::rosc::RingOscillator;
use rp2040_hal::xosc::{setup_xosc_blocking, CrystalOscillator, Stable};
use rp2040_hal::Clock;

pub type RunOscillator = CrystalOscillator<Stable>;
pub type SleepOscillator = RingOscillator<bsp::hal::rosc::Enabled>;

/// Runs everything off the crystal.  The supervisor does nothing that needs speed, and the
/// timer tick (from clk_ref) has to stay accurate while clk_sys moves around during sleep.
pub fn setup_xosc_as_system_clock(
    clocks_peripheral: CLOCKS,
    xosc_peripheral: XOSC,
    rosc_peripheral: ROSC,
) -> (ClocksManager, RunOscillator, SleepOscillator) {
    let xosc_freq: HertzU32 = XOSC_CRYSTAL_FREQ.Hz();
    let Ok(xosc) = setup_xosc_blocking(xosc_peripheral, xosc_freq) else {
        defmt::panic!("xosc");
    };
    // Kept running for sleeping on; the crystal has to keep going for the timer anyway.
    let rosc = RingOscillator::new(rosc_peripheral).initialize();

    let mut clocks = ClocksManager::new(clocks_peripheral);
    clocks.reference_clock.configure_clock(&xosc, xosc_freq).unwrap();
    clocks.system_clock.configure_clock(&xosc, xosc_freq).unwrap();
    clocks
        .peripheral_clock
        .configure_clock(&clocks.system_clock, clocks.system_clock.freq())
        .unwrap();
    // Slower than the nominal 48MHz, but a conversion still only takes 8µs.
    clocks.adc_clock.configure_clock(&xosc, xosc_freq).unwrap();

    // NOTE: PLLs are disabled by default.
    clocks.usb_clock.disable();
    clocks.gpio_output0_clock.disable();
    clocks.gpio_output1_clock.disable();
    clocks.gpio_output2_clock.disable();
    clocks.gpio_output3_clock.disable();
    clocks.rtc_clock.disable();

    (clocks, xosc, rosc)
}

pub fn switch_system_clock_to_rosc(
    clocks: &mut ClocksManager,
    rosc: &SleepOscillator,
) -> Result<(), SleepError> {
    let sleep_freq = rosc.get_freq() / crate::constants::SLEEP_CLOCK_DIVIDER;
    clocks
        .system_clock
        .configure_clock(rosc, sleep_freq)
        .map_err(|_| SleepError::ClockSwitchFailed)
}

pub fn switch_system_clock_to_xosc(
    clocks: &mut ClocksManager,
    xosc: &RunOscillator,
) -> Result<(), SleepError> {
    clocks
        .system_clock
        .configure_clock(xosc, XOSC_CRYSTAL_FREQ.Hz())
        .map_err(|_| SleepError::ClockSwitchFailed)
}

/// Puts clk_sys back onto clk_ref (the crystal) by poking the registers directly.  Used from
/// interrupt context, where the `ClocksManager` is out of reach; the device resets straight
/// after, so the manager's idea of the clock tree going stale doesn't matter.
pub struct InterruptClockRestore;

impl RunModeRestore for InterruptClockRestore {
    fn restore_run_mode(&mut self) {
        let clocks = unsafe { &*CLOCKS::ptr() };
        // Integer divider of 1, in the top 24 bits.
        clocks.clk_sys_div().write(|w| unsafe { w.bits(1 << 8) });
        clocks.clk_sys_ctrl().modify(|_, w| w.src().clk_ref());
        while clocks.clk_sys_selected().read().bits() & 1 == 0 {
            cortex_m::asm::nop();
        }
    }
}
