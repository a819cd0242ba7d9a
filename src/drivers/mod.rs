//! Ready-made device drivers.
//!
//! Each driver owns a [`VirtualDevice`] registered with a fixed capability
//! set and translates its operations into event groups.

mod custom;
mod dial;
mod gamepad;
mod keyboard;
mod mouse;
mod tablet;
mod touchpad;

pub use custom::CustomDevice;
pub use dial::{DIAL_IDENTITY, Dial};
pub use gamepad::{GAMEPAD_BUTTONS, GAMEPAD_IDENTITY, Gamepad, HatDirection};
pub use keyboard::{KEYBOARD_IDENTITY, Keyboard};
pub use mouse::{MOUSE_IDENTITY, Mouse};
pub use tablet::{DrawingTablet, TABLET_IDENTITY, TABLET_TOOLS, TILT_RANGE};
pub use touchpad::{TOUCHPAD_IDENTITY, TouchBounds, TouchPad};

use crate::capabilities::CapabilitySet;
use crate::config::DeviceIdentity;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::node::{DeviceNode, UinputNode};
use std::path::Path;

/// The built-in device kinds, for callers that pick one at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Gamepad,
    DrawingTablet,
    Keyboard,
    Mouse,
    TouchPad(TouchBounds),
    Dial,
}

impl DeviceKind {
    pub fn all() -> [DeviceKind; 6] {
        [
            DeviceKind::Gamepad,
            DeviceKind::DrawingTablet,
            DeviceKind::Keyboard,
            DeviceKind::Mouse,
            DeviceKind::TouchPad(TouchBounds::default()),
            DeviceKind::Dial,
        ]
    }

    pub fn capabilities(&self) -> CapabilitySet {
        match self {
            DeviceKind::Gamepad => gamepad::capabilities(),
            DeviceKind::DrawingTablet => tablet::capabilities(),
            DeviceKind::Keyboard => keyboard::capabilities(),
            DeviceKind::Mouse => mouse::capabilities(),
            DeviceKind::TouchPad(bounds) => touchpad::capabilities(*bounds),
            DeviceKind::Dial => dial::capabilities(),
        }
    }

    pub fn default_identity(&self) -> DeviceIdentity {
        match self {
            DeviceKind::Gamepad => GAMEPAD_IDENTITY,
            DeviceKind::DrawingTablet => TABLET_IDENTITY,
            DeviceKind::Keyboard => KEYBOARD_IDENTITY,
            DeviceKind::Mouse => MOUSE_IDENTITY,
            DeviceKind::TouchPad(_) => TOUCHPAD_IDENTITY,
            DeviceKind::Dial => DIAL_IDENTITY,
        }
    }

    /// Registers a plain [`VirtualDevice`] with this kind's defaults.
    pub fn create(&self, path: impl AsRef<Path>, name: &str) -> Result<VirtualDevice<UinputNode>> {
        VirtualDevice::create(path, name, self.default_identity(), self.capabilities())
    }

    pub fn create_on<N: DeviceNode>(&self, node: N, name: &str) -> Result<VirtualDevice<N>> {
        VirtualDevice::create_on(node, name, self.default_identity(), self.capabilities())
    }
}
