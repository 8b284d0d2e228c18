//! Device selection policies.
//!
//! Both policies are deliberately simple and observable: the default device
//! is the first one the platform lists, and switching scans from the start of
//! the list for the first device that is not the current one. With more than
//! two devices this means repeated switching alternates between the first two
//! entries rather than cycling through all of them.

use crate::types::{DeviceDescriptor, LensFacing};
use serde::{Deserialize, Serialize};

/// How the default device is chosen on `initialize()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", content = "facing", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First entry in platform enumeration order. Not necessarily the back camera.
    #[default]
    FirstListed,
    /// First entry with the given facing, falling back to the first entry.
    PreferFacing(LensFacing),
}

impl SelectionPolicy {
    pub fn select<'a>(&self, devices: &'a [DeviceDescriptor]) -> Option<&'a DeviceDescriptor> {
        match self {
            SelectionPolicy::FirstListed => devices.first(),
            SelectionPolicy::PreferFacing(facing) => devices
                .iter()
                .find(|d| d.facing == *facing)
                .or_else(|| devices.first()),
        }
    }
}

/// Pick the device to switch to: the first entry, scanning from index 0,
/// that is not `current`.
pub fn next_device<'a>(
    devices: &'a [DeviceDescriptor],
    current: Option<&DeviceDescriptor>,
) -> Option<&'a DeviceDescriptor> {
    match current {
        Some(current) => devices.iter().find(|d| !d.same_device(current)),
        None => devices.first(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cams() -> Vec<DeviceDescriptor> {
        vec![
            DeviceDescriptor::new("a", LensFacing::Back),
            DeviceDescriptor::new("b", LensFacing::Front),
            DeviceDescriptor::new("c", LensFacing::External),
        ]
    }

    #[test]
    fn test_first_listed() {
        let devices = cams();
        assert_eq!(SelectionPolicy::FirstListed.select(&devices), devices.first());
        assert_eq!(SelectionPolicy::FirstListed.select(&[]), None);
    }

    #[test]
    fn test_prefer_facing_with_fallback() {
        let devices = cams();
        let front = SelectionPolicy::PreferFacing(LensFacing::Front).select(&devices);
        assert_eq!(front.map(|d| d.id.as_str()), Some("b"));

        let only_back = vec![DeviceDescriptor::new("a", LensFacing::Back)];
        let fallback = SelectionPolicy::PreferFacing(LensFacing::Front).select(&only_back);
        assert_eq!(fallback.map(|d| d.id.as_str()), Some("a"));
    }

    #[test]
    fn test_next_device_scans_from_start() {
        let devices = cams();
        // From "c" the scan starts at index 0, so "a" wins over wrapping to the next entry.
        let next = next_device(&devices, Some(&devices[2]));
        assert_eq!(next.map(|d| d.id.as_str()), Some("a"));

        let next = next_device(&devices, Some(&devices[0]));
        assert_eq!(next.map(|d| d.id.as_str()), Some("b"));
    }

    #[test]
    fn test_next_device_single_entry() {
        let devices = vec![DeviceDescriptor::new("a", LensFacing::Back)];
        assert_eq!(next_device(&devices, Some(&devices[0])), None);
    }
}
