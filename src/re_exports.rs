#[allow(unused)]
pub mod log {
    #[cfg(not(feature = "std"))]
    pub use defmt::{error, info, trace, warn};
    #[cfg(feature = "std")]
    pub use log::{error, info, trace, warn};
}
