pub use cortex_m_rt::entry;
pub use rp2040_hal as hal;
pub use rp2040_hal::pac;

pub use crate::constants::XOSC_CRYSTAL_FREQ;
