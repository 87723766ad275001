use crate::interrupt_context::{InterruptContext, ResetRequest};
use crate::re_exports::log::{info, warn};

/// A GPIO input that can raise an interrupt on a rising edge.
pub trait EdgeInterruptPin {
    fn enable_rising_edge_interrupt(&mut self);
    fn rising_edge_pending(&self) -> bool;
    fn clear_rising_edge(&mut self);
}

/// Puts clocks and power back to normal running state from inside an interrupt.
pub trait RunModeRestore {
    fn restore_run_mode(&mut self);
}

pub trait PowerWatch {
    fn arm(&mut self);
}

#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WatcherState {
    Disarmed,
    Armed,
    ResetInProgress,
}

#[must_use]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Something else on the GPIO bank interrupted; still armed.
    NotOurs,
    Reset(ResetRequest),
}

pub struct ExternalPowerWatcher<P: EdgeInterruptPin> {
    pin: P,
    state: WatcherState,
}

impl<P: EdgeInterruptPin> ExternalPowerWatcher<P> {
    pub fn new(pin: P) -> ExternalPowerWatcher<P> {
        ExternalPowerWatcher { pin, state: WatcherState::Disarmed }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Body of the GPIO bank interrupt.
    pub fn on_interrupt(
        &mut self,
        ctx: &InterruptContext,
        power: &mut impl RunModeRestore,
    ) -> EdgeOutcome {
        // We may have been asleep on the ring oscillator; don't poke at the io bank until
        // clocks are back.
        power.restore_run_mode();
        if self.state != WatcherState::Armed || !self.pin.rising_edge_pending() {
            return EdgeOutcome::NotOurs;
        }
        self.pin.clear_rising_edge();
        self.state = WatcherState::ResetInProgress;
        EdgeOutcome::Reset(ctx.request_reset())
    }
}

impl<P: EdgeInterruptPin> PowerWatch for ExternalPowerWatcher<P> {
    fn arm(&mut self) {
        match self.state {
            WatcherState::Disarmed => {
                // Don't let an edge from before we armed count.
                self.pin.clear_rising_edge();
                self.pin.enable_rising_edge_interrupt();
                self.state = WatcherState::Armed;
                info!("Armed external power detect");
            }
            WatcherState::Armed => {}
            WatcherState::ResetInProgress => {
                warn!("Not re-arming external power detect, reset in progress");
            }
        }
    }
}
