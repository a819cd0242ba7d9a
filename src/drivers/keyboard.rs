use crate::capabilities::CapabilitySet;
use crate::codes::{KEY_ESC, KEY_MICMUTE};
use crate::config::DeviceIdentity;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::node::{DeviceNode, UinputNode};
use std::path::Path;

pub const KEYBOARD_IDENTITY: DeviceIdentity = DeviceIdentity::usb(0x4711, 0x0815);

/// Every key from `KEY_ESC` to `KEY_MICMUTE`.
pub fn capabilities() -> CapabilitySet {
    CapabilitySet::new().keys(KEY_ESC..=KEY_MICMUTE)
}

pub struct Keyboard<N: DeviceNode = UinputNode> {
    device: VirtualDevice<N>,
}

impl Keyboard<UinputNode> {
    pub fn create(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let device = VirtualDevice::create(path, name, KEYBOARD_IDENTITY, capabilities())?;
        Ok(Self { device })
    }
}

impl<N: DeviceNode> Keyboard<N> {
    pub fn create_on(node: N, name: &str) -> Result<Self> {
        let device = VirtualDevice::create_on(node, name, KEYBOARD_IDENTITY, capabilities())?;
        Ok(Self { device })
    }

    pub fn device(&self) -> &VirtualDevice<N> {
        &self.device
    }

    pub fn key_press(&self, key: u16) -> Result<()> {
        self.device.key_press(key)
    }

    /// The key stays held until [`key_up`](Self::key_up).
    pub fn key_down(&self, key: u16) -> Result<()> {
        self.device.key_down(key)
    }

    pub fn key_up(&self, key: u16) -> Result<()> {
        self.device.key_up(key)
    }

    pub fn close(&self) -> Result<()> {
        self.device.close()
    }
}
