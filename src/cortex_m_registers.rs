use crate::firmware_handoff::RegisterAccess;
use core::convert::Infallible;
use core::ptr::{read_volatile, write_volatile};

/// Volatile access to the real address space.
pub struct CortexMRegisters {
    _private: (),
}

impl CortexMRegisters {
    /// # Safety
    ///
    /// Only one of these may exist, and nothing else may be using the addresses it's given
    /// (XIP flash and the System Control Block).
    pub unsafe fn new() -> CortexMRegisters {
        CortexMRegisters { _private: () }
    }
}

impl RegisterAccess for CortexMRegisters {
    type Exit = Infallible;

    fn read_word(&self, address: u32) -> u32 {
        unsafe { read_volatile(address as *const u32) }
    }

    fn write_word(&mut self, address: u32, value: u32) {
        unsafe { write_volatile(address as *mut u32, value) }
        // Make sure the write lands before anything that depends on it (VTOR before the next
        // exception).
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }

    fn branch(&mut self, stack_pointer: u32, entry: u32) -> Infallible {
        // `bootstrap` does `msr msp` then `bx`, so no return address is left behind.
        unsafe { cortex_m::asm::bootstrap(stack_pointer as *const u32, entry as *const u32) }
    }
}
