use crate::clock_utils::{
    switch_system_clock_to_rosc, switch_system_clock_to_xosc, RunOscillator, SleepOscillator,
};
use crate::interrupt_context::InterruptContext;
use crate::re_exports::log::error;
use crate::sleep_controller::{on_wake_alarm, SleepError, SleepHardware, SLEEP_WAKE_FLAG};
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::v2::OutputPin;
use fugit::MicrosDurationU32;
use rp2040_hal::clocks::ClocksManager;
use rp2040_hal::gpio::bank0::Gpio15;
use rp2040_hal::gpio::{FunctionSioOutput, Pin, PullDown};
use rp2040_hal::pac::{self, interrupt};
use rp2040_hal::timer::{Alarm, Alarm0};

pub type SleepIndicatorPin = Pin<Gpio15, FunctionSioOutput, PullDown>;

// Shared with TIMER_IRQ_0, which has to acknowledge the alarm.
static WAKE_ALARM: Mutex<RefCell<Option<Alarm0>>> = Mutex::new(RefCell::new(None));

/// Sleeps on a divided-down ring oscillator and wakes from timer alarm 0.
pub struct TimerSleepHardware {
    clocks: ClocksManager,
    xosc: RunOscillator,
    rosc: SleepOscillator,
    indicator: SleepIndicatorPin,
}

impl TimerSleepHardware {
    pub fn new(
        alarm: Alarm0,
        clocks: ClocksManager,
        xosc: RunOscillator,
        rosc: SleepOscillator,
        indicator: SleepIndicatorPin,
    ) -> TimerSleepHardware {
        critical_section::with(|cs| WAKE_ALARM.borrow_ref_mut(cs).replace(alarm));
        unsafe {
            pac::NVIC::unmask(pac::Interrupt::TIMER_IRQ_0);
        }
        TimerSleepHardware { clocks, xosc, rosc, indicator }
    }

    pub fn clocks(&self) -> &ClocksManager {
        &self.clocks
    }
}

impl SleepHardware for TimerSleepHardware {
    fn enter_low_power(&mut self) -> Result<(), SleepError> {
        let _ = self.indicator.set_high();
        switch_system_clock_to_rosc(&mut self.clocks, &self.rosc)
    }

    fn exit_low_power(&mut self) {
        if let Err(e) = switch_system_clock_to_xosc(&mut self.clocks, &self.xosc) {
            error!("Couldn't restore system clock: {:?}", e);
        }
        let _ = self.indicator.set_low();
    }

    fn schedule_wake(&mut self, after: MicrosDurationU32) -> Result<(), SleepError> {
        critical_section::with(|cs| {
            let mut alarm = WAKE_ALARM.borrow_ref_mut(cs);
            let alarm = alarm.as_mut().ok_or(SleepError::NoAlarm)?;
            alarm.clear_interrupt();
            alarm.schedule(after).map_err(|_| SleepError::AlarmTooFar)?;
            alarm.enable_interrupt();
            Ok(())
        })
    }

    fn cancel_wake(&mut self) {
        critical_section::with(|cs| {
            if let Some(alarm) = WAKE_ALARM.borrow_ref_mut(cs).as_mut() {
                alarm.disable_interrupt();
                let _ = alarm.cancel();
                alarm.clear_interrupt();
            }
        });
    }

    fn wake_alarm_due(&self) -> bool {
        critical_section::with(|cs| {
            WAKE_ALARM.borrow_ref(cs).as_ref().map_or(false, Alarm::finished)
        })
    }

    fn wait_for_interrupt(&mut self) {
        cortex_m::asm::wfi();
    }
}

#[interrupt]
fn TIMER_IRQ_0() {
    critical_section::with(|cs| {
        if let Some(alarm) = WAKE_ALARM.borrow_ref_mut(cs).as_mut() {
            alarm.clear_interrupt();
            alarm.disable_interrupt();
        }
    });
    InterruptContext::enter(|ctx| on_wake_alarm(ctx, &SLEEP_WAKE_FLAG));
}
