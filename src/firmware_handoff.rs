//! Starting the main firmware image the way boot2 would, but from our own address.
//!
//! Header layout at the image base, both words little endian:
//!
//! | offset | contents              |
//! |--------|-----------------------|
//! | 0      | initial stack pointer |
//! | 4      | reset/entry vector    |
use crate::re_exports::log::info;

/// Cortex-M0+ System Control Block vector table offset register.
pub const VTOR_ADDRESS: u32 = 0xe000_0000 + 0xed08;

pub const SRAM_BASE: u32 = 0x2000_0000;
// Striped SRAM0-3 plus the two 4kB scratch banks.
pub const SRAM_END: u32 = 0x2004_2000;
pub const FLASH_XIP_END: u32 = 0x1100_0000;
const ERASED_FLASH_WORD: u32 = 0xffff_ffff;

/// The only access to raw addresses in the supervisor.
pub trait RegisterAccess {
    /// What `branch` hands back.  On hardware this is uninhabited.
    type Exit;

    fn read_word(&self, address: u32) -> u32;
    fn write_word(&mut self, address: u32, value: u32);
    /// Load MSP with `stack_pointer` and branch, without linking, to `entry`.
    fn branch(&mut self, stack_pointer: u32, entry: u32) -> Self::Exit;
}

#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FirmwareHeader {
    pub initial_stack_pointer: u32,
    pub entry_vector: u32,
}

impl FirmwareHeader {
    /// Entry address with the Thumb bit forced on; the M0+ faults on an ARM state branch.
    pub fn thumb_entry(&self) -> u32 {
        self.entry_vector | 1
    }
}

#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderError {
    Erased,
    StackPointerOutOfRange(u32),
    StackPointerMisaligned(u32),
    EntryOutOfRange(u32),
}

pub struct FirmwareHandoff<R: RegisterAccess> {
    registers: R,
    image_base: u32,
}

impl<R: RegisterAccess> FirmwareHandoff<R> {
    pub fn new(registers: R, image_base: u32) -> FirmwareHandoff<R> {
        FirmwareHandoff { registers, image_base }
    }

    pub fn image_base(&self) -> u32 {
        self.image_base
    }

    pub fn registers(&self) -> &R {
        &self.registers
    }

    pub fn read_header(&self) -> FirmwareHeader {
        FirmwareHeader {
            initial_stack_pointer: self.registers.read_word(self.image_base),
            entry_vector: self.registers.read_word(self.image_base + 4),
        }
    }

    /// Reads the header and checks it looks like something we can jump to.
    pub fn validated_header(&self) -> Result<FirmwareHeader, HeaderError> {
        let header = self.read_header();
        let FirmwareHeader { initial_stack_pointer, entry_vector } = header;
        if initial_stack_pointer == ERASED_FLASH_WORD && entry_vector == ERASED_FLASH_WORD {
            return Err(HeaderError::Erased);
        }
        // The stack is full-descending, so the initial value may be one past the end of SRAM.
        if !(SRAM_BASE..=SRAM_END).contains(&initial_stack_pointer) {
            return Err(HeaderError::StackPointerOutOfRange(initial_stack_pointer));
        }
        if initial_stack_pointer % 4 != 0 {
            return Err(HeaderError::StackPointerMisaligned(initial_stack_pointer));
        }
        let entry_address = entry_vector & !1;
        if entry_address <= self.image_base || entry_address >= FLASH_XIP_END {
            return Err(HeaderError::EntryOutOfRange(entry_vector));
        }
        Ok(header)
    }

    /// Points the vector table at the image and jumps into it.  Whatever the supervisor left
    /// configured (peripherals, armed interrupts) is the new firmware's problem.
    pub fn boot(mut self, header: FirmwareHeader) -> R::Exit {
        info!(
            "Handing off to firmware at {:#x}, sp {:#x}, entry {:#x}",
            self.image_base,
            header.initial_stack_pointer,
            header.thumb_entry()
        );
        self.registers.write_word(VTOR_ADDRESS, self.image_base);
        self.registers.branch(header.initial_stack_pointer, header.thumb_entry())
    }
}
