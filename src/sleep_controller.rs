use crate::interrupt_context::InterruptContext;
use crate::re_exports::log::{info, warn};
use core::cell::Cell;
use critical_section::{CriticalSection, Mutex};
use fugit::{MicrosDurationU32, MinutesDurationU32};

// RP2040 alarms compare against the low 32 bits of the microsecond timer (~71 minutes), so keep
// each scheduled interval comfortably inside that.
pub const MAX_ALARM_INTERVAL_US: u32 = 60 * 60 * 1_000_000;

/// Raised by the wake alarm interrupt, taken once by the sleeping loop.
pub struct WakeFlag {
    raised: Mutex<Cell<bool>>,
}

impl WakeFlag {
    pub const fn new() -> WakeFlag {
        WakeFlag { raised: Mutex::new(Cell::new(false)) }
    }

    pub(crate) fn raise(&self, cs: CriticalSection) {
        self.raised.borrow(cs).set(true);
    }

    /// Returns whether the flag was raised, and lowers it.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| self.raised.borrow(cs).replace(false))
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(false));
    }
}

impl Default for WakeFlag {
    fn default() -> Self {
        WakeFlag::new()
    }
}

pub static SLEEP_WAKE_FLAG: WakeFlag = WakeFlag::new();

/// Body of the wake alarm interrupt.
pub fn on_wake_alarm(ctx: &InterruptContext, flag: &WakeFlag) {
    ctx.raise_wake_flag(flag);
}

#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WakeReason {
    TimerExpired,
    /// WFI came back with the alarm due but nobody raised the flag.
    Spurious,
    /// The alarm couldn't be scheduled, so we never actually slept.
    AlarmUnavailable,
}

#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SleepError {
    NoAlarm,
    AlarmTooFar,
    ClockSwitchFailed,
}

/// The pieces of the chip the sleep controller drives.
pub trait SleepHardware {
    /// Switch the system clock onto the low power source.
    fn enter_low_power(&mut self) -> Result<(), SleepError>;
    /// Back onto the run clock configuration.
    fn exit_low_power(&mut self);
    fn schedule_wake(&mut self, after: MicrosDurationU32) -> Result<(), SleepError>;
    fn cancel_wake(&mut self);
    fn wake_alarm_due(&self) -> bool;
    fn wait_for_interrupt(&mut self);
}

pub trait Sleeper {
    fn sleep_for(&mut self, duration: MinutesDurationU32) -> WakeReason;
}

pub struct SleepController<H: SleepHardware> {
    hardware: H,
    wake_flag: &'static WakeFlag,
}

impl<H: SleepHardware> SleepController<H> {
    pub fn new(hardware: H, wake_flag: &'static WakeFlag) -> SleepController<H> {
        SleepController { hardware, wake_flag }
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    fn sleep_one_interval(&mut self, interval: MicrosDurationU32) -> WakeReason {
        if let Err(e) = self.hardware.schedule_wake(interval) {
            warn!("Couldn't schedule wake alarm: {:?}", e);
            return WakeReason::AlarmUnavailable;
        }
        loop {
            // Read the alarm before the flag: the interrupt preempts as soon as the alarm is due,
            // so a due alarm with a lowered flag really means nobody is coming to raise it.
            let due = self.hardware.wake_alarm_due();
            if self.wake_flag.take() {
                return WakeReason::TimerExpired;
            }
            if due {
                return WakeReason::Spurious;
            }
            self.hardware.wait_for_interrupt();
        }
    }
}

impl<H: SleepHardware> Sleeper for SleepController<H> {
    fn sleep_for(&mut self, duration: MinutesDurationU32) -> WakeReason {
        let mut remaining_us = u64::from(duration.to_secs()) * 1_000_000;
        info!("Sleeping for {} minutes", duration.ticks());
        // A flag left over from an earlier sleep must not end this one.
        self.wake_flag.clear();
        if let Err(e) = self.hardware.enter_low_power() {
            warn!("Staying on run clocks while sleeping: {:?}", e);
        }
        let mut reason = WakeReason::TimerExpired;
        while remaining_us > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let interval_us = remaining_us.min(u64::from(MAX_ALARM_INTERVAL_US)) as u32;
            reason = self.sleep_one_interval(MicrosDurationU32::micros(interval_us));
            if reason != WakeReason::TimerExpired {
                self.hardware.cancel_wake();
                break;
            }
            remaining_us -= u64::from(interval_us);
        }
        self.hardware.exit_low_power();
        info!("Woke up: {:?}", reason);
        reason
    }
}
