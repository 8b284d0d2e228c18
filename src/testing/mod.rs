//! Testing utilities for crabshot
//!
//! Provides a scripted in-memory camera capability so session behavior can be
//! exercised without hardware.

pub mod mock_capability;

pub use mock_capability::{MockCapability, MockHandle};
