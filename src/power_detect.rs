use crate::clock_utils::InterruptClockRestore;
use crate::constants::POWER_DETECT_PIN;
use crate::external_power::{EdgeInterruptPin, EdgeOutcome, ExternalPowerWatcher, PowerWatch};
use crate::interrupt_context::{InterruptContext, ResetRequest};
use crate::re_exports::log::info;
use crate::utils::restart;
use core::cell::RefCell;
use critical_section::Mutex;
use rp2040_hal::gpio::bank0::Gpio24;
use rp2040_hal::gpio::{FunctionSioInput, Interrupt, Pin, PullDown};
use rp2040_hal::pac::{self, interrupt};
use rp2040_hal::Watchdog;

/// VBUS sense on the Pico: goes high when USB (or the solar charger) is supplying power.
pub type PowerDetectPin = Pin<Gpio24, FunctionSioInput, PullDown>;

impl EdgeInterruptPin for PowerDetectPin {
    fn enable_rising_edge_interrupt(&mut self) {
        self.set_interrupt_enabled(Interrupt::EdgeHigh, true);
        unsafe {
            pac::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
        }
    }

    fn rising_edge_pending(&self) -> bool {
        self.interrupt_status(Interrupt::EdgeHigh)
    }

    fn clear_rising_edge(&mut self) {
        self.clear_interrupt(Interrupt::EdgeHigh);
    }
}

static POWER_WATCHER: Mutex<RefCell<Option<ExternalPowerWatcher<PowerDetectPin>>>> =
    Mutex::new(RefCell::new(None));
static RESET_WATCHDOG: Mutex<RefCell<Option<Watchdog>>> = Mutex::new(RefCell::new(None));

/// Hands the pin and watchdog over to the interrupt handler, and returns the handle the decision
/// loop arms it through.
pub fn install(pin: PowerDetectPin, watchdog: Watchdog) -> PowerDetectHandle {
    critical_section::with(|cs| {
        POWER_WATCHER.borrow_ref_mut(cs).replace(ExternalPowerWatcher::new(pin));
        RESET_WATCHDOG.borrow_ref_mut(cs).replace(watchdog);
    });
    info!("External power detect on gpio{}", POWER_DETECT_PIN);
    PowerDetectHandle { _private: () }
}

pub struct PowerDetectHandle {
    _private: (),
}

impl PowerWatch for PowerDetectHandle {
    fn arm(&mut self) {
        critical_section::with(|cs| {
            if let Some(watcher) = POWER_WATCHER.borrow_ref_mut(cs).as_mut() {
                watcher.arm();
            }
        });
    }
}

fn reset_now(_request: ResetRequest) -> ! {
    let watchdog = critical_section::with(|cs| RESET_WATCHDOG.borrow_ref_mut(cs).take());
    match watchdog {
        Some(mut watchdog) => restart(&mut watchdog),
        None => cortex_m::peripheral::SCB::sys_reset(),
    }
}

#[interrupt]
fn IO_IRQ_BANK0() {
    let outcome = InterruptContext::enter(|ctx| {
        let mut watcher = POWER_WATCHER.borrow_ref_mut(ctx.critical_section());
        let outcome = match watcher.as_mut() {
            Some(watcher) => watcher.on_interrupt(ctx, &mut InterruptClockRestore),
            None => EdgeOutcome::NotOurs,
        };
        outcome
    });
    if let EdgeOutcome::Reset(request) = outcome {
        reset_now(request);
    }
}
