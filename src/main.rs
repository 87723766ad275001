#![no_std]
#![no_main]
#![warn(clippy::all, clippy::pedantic)]
mod boot_decision;
mod bsp;
mod clock_utils;
mod constants;
mod cortex_m_registers;
mod external_power;
mod firmware_handoff;
mod interrupt_context;
mod power_detect;
mod re_exports;
mod sleep_controller;
mod timer_sleep;
mod utils;
mod voltage_sensor;
mod vsys_adc;

use crate::boot_decision::{Supervisor, SupervisorConfig};
use crate::constants::{
    FIRMWARE_ENTRY, HIGH_THRESHOLD_MV, MID_THRESHOLD_MV, RECHECK_THRESHOLD_MV,
    SLEEP_DURATION_MINUTES, SUPERVISOR_VERSION, XOSC_CRYSTAL_FREQ,
};
use crate::cortex_m_registers::CortexMRegisters;
use crate::firmware_handoff::FirmwareHandoff;
use crate::sleep_controller::{SleepController, SLEEP_WAKE_FLAG};
use crate::timer_sleep::TimerSleepHardware;
use crate::vsys_adc::VsysSensor;
use bsp::{
    entry,
    hal::{adc::Adc, adc::AdcPin, clocks::Clock, sio::Sio, Timer, Watchdog},
    pac::Peripherals,
};
use defmt::{info, panic};
use defmt_rtt as _;
use panic_probe as _;

#[entry]
fn main() -> ! {
    /*
        We're here because either:

        - The main firmware reset us because it wants to sleep
        - Power has been restored
        - External power showed up while we were asleep
    */
    info!("Startup power supervisor {}", SUPERVISOR_VERSION);
    let mut peripherals: Peripherals = Peripherals::take().unwrap();

    let (clocks, xosc, rosc) = clock_utils::setup_xosc_as_system_clock(
        peripherals.CLOCKS,
        peripherals.XOSC,
        peripherals.ROSC,
    );
    info!("System clock speed {}MHz", clocks.system_clock.freq().to_MHz());

    // Watchdog ticks are required to run the timer peripheral, since they're shared between both.
    let mut watchdog = Watchdog::new(peripherals.WATCHDOG);
    #[allow(clippy::cast_possible_truncation)]
    watchdog.enable_tick_generation((XOSC_CRYSTAL_FREQ / 1_000_000) as u8);
    let mut timer = Timer::new(peripherals.TIMER, &mut peripherals.RESETS, &clocks);
    let sio = Sio::new(peripherals.SIO);
    let pins = rp2040_hal::gpio::Pins::new(
        peripherals.IO_BANK0,
        peripherals.PADS_BANK0,
        sio.gpio_bank0,
        &mut peripherals.RESETS,
    );

    let sensor = {
        let adc = Adc::new(peripherals.ADC, &mut peripherals.RESETS);
        let Ok(vsys_pin) = AdcPin::new(pins.gpio29.into_floating_disabled()) else {
            panic!("gpio29 isn't an adc pin");
        };
        VsysSensor::new(adc, vsys_pin)
    };

    let power_watch = power_detect::install(pins.gpio24.into_pull_down_input(), watchdog);

    let sleeper = {
        let Some(alarm) = timer.alarm_0() else {
            panic!("alarm 0 already taken");
        };
        let indicator = pins.gpio15.into_push_pull_output();
        SleepController::new(
            TimerSleepHardware::new(alarm, clocks, xosc, rosc, indicator),
            &SLEEP_WAKE_FLAG,
        )
    };

    let firmware = FirmwareHandoff::new(unsafe { CortexMRegisters::new() }, FIRMWARE_ENTRY);

    info!(
        "Thresholds: boot above {}mV, recheck above {}mV after sleeping if above {}mV, sleep {} min",
        HIGH_THRESHOLD_MV, RECHECK_THRESHOLD_MV, MID_THRESHOLD_MV, SLEEP_DURATION_MINUTES
    );
    let supervisor =
        match Supervisor::new(SupervisorConfig::DEFAULT, sensor, sleeper, power_watch, firmware) {
            Ok(supervisor) => supervisor,
            Err(e) => panic!("Bad supervisor config {}", e),
        };
    match supervisor.run() {}
}
