//! Hardware-backed camera capability.

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::{NokhwaCapability, NokhwaHandle};
