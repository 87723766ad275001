use critical_section::CriticalSection;

/// What an interrupt handler is allowed to do.
///
/// Handlers can fire while most of the chip is clocked down, so they get exactly two
/// capabilities: raise a wake flag, or ask for the device to be reset.  Anything else
/// (sampling, sleeping, logging over RTT, handing off) stays in thread mode.
pub struct InterruptContext<'cs> {
    cs: CriticalSection<'cs>,
}

/// Proof that an interrupt handler decided the device must reset.  Only an
/// `InterruptContext` can make one.
#[must_use]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub struct ResetRequest {
    _private: (),
}

impl<'cs> InterruptContext<'cs> {
    pub fn enter<R>(f: impl FnOnce(&InterruptContext) -> R) -> R {
        critical_section::with(|cs| f(&InterruptContext { cs }))
    }

    pub fn raise_wake_flag(&self, flag: &crate::sleep_controller::WakeFlag) {
        flag.raise(self.cs);
    }

    pub fn request_reset(&self) -> ResetRequest {
        ResetRequest { _private: () }
    }

    /// For borrowing the statics an interrupt handler shares with thread mode.
    pub(crate) fn critical_section(&self) -> CriticalSection<'cs> {
        self.cs
    }
}
