use crate::capabilities::CapabilitySet;
use crate::codes::{BUS_BLUETOOTH, BUS_USB, BUS_VIRTUAL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_UINPUT_PATH: &str = "/dev/uinput";

/// Environment variable that overrides [`DEFAULT_UINPUT_PATH`].
pub const UINPUT_PATH_ENV: &str = "VHID_UINPUT_PATH";

/// The uinput node to open, honoring `VHID_UINPUT_PATH`.
pub fn default_device_path() -> PathBuf {
    std::env::var_os(UINPUT_PATH_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UINPUT_PATH))
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusType {
    Usb = BUS_USB,
    Bluetooth = BUS_BLUETOOTH,
    Virtual = BUS_VIRTUAL,
}

impl BusType {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            BUS_USB => BusType::Usb,
            BUS_BLUETOOTH => BusType::Bluetooth,
            _ => BusType::Virtual,
        }
    }
}

/// The `input_id` a device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub bustype: BusType,
    pub vendor: u16,
    pub product: u16,
    #[serde(default = "default_version")]
    pub version: u16,
}

fn default_version() -> u16 {
    1
}

impl DeviceIdentity {
    pub const fn usb(vendor: u16, product: u16) -> Self {
        Self {
            bustype: BusType::Usb,
            vendor,
            product,
            version: 1,
        }
    }
}

/// A device described entirely by configuration, usually loaded from JSON.
///
/// ```json
/// {
///   "name": "Foot pedal",
///   "identity": { "bustype": "usb", "vendor": 4660, "product": 22136 },
///   "capabilities": {
///     "keys": [256],
///     "absolute": { "2": { "minimum": 0, "maximum": 1023 } }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    pub identity: DeviceIdentity,
    pub capabilities: CapabilitySet,
}

impl DeviceSpec {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::ABS_Z;

    #[test]
    fn spec_parses_from_json() {
        let spec = DeviceSpec::from_json(
            r#"{
                "name": "Foot pedal",
                "identity": { "bustype": "usb", "vendor": 4660, "product": 22136 },
                "capabilities": {
                    "keys": [256],
                    "absolute": { "2": { "minimum": 0, "maximum": 1023 } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(spec.identity, DeviceIdentity::usb(0x1234, 0x5678));
        assert!(spec.capabilities.has_key(256));
        assert_eq!(
            spec.capabilities.calibration(ABS_Z).map(|c| c.maximum),
            Some(1023)
        );
    }

    #[test]
    fn spec_survives_json() {
        let spec = DeviceSpec {
            name: "knob".into(),
            identity: DeviceIdentity::usb(1, 2),
            capabilities: CapabilitySet::new().relative(crate::codes::REL_DIAL),
        };
        let json = spec.to_json().unwrap();
        assert_eq!(DeviceSpec::from_json(&json).unwrap(), spec);
    }

    #[test]
    fn unknown_bus_is_virtual() {
        assert_eq!(BusType::from_raw(0x19), BusType::Virtual);
        assert_eq!(BusType::from_raw(0x05), BusType::Bluetooth);
    }
}
