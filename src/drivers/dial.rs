use crate::capabilities::CapabilitySet;
use crate::codes::REL_DIAL;
use crate::config::DeviceIdentity;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::node::{DeviceNode, UinputNode};
use std::path::Path;

pub const DIAL_IDENTITY: DeviceIdentity = DeviceIdentity::usb(0x4711, 0x0819);

pub fn capabilities() -> CapabilitySet {
    CapabilitySet::new().relative(REL_DIAL)
}

/// A rotary knob reporting relative turns.
pub struct Dial<N: DeviceNode = UinputNode> {
    device: VirtualDevice<N>,
}

impl Dial<UinputNode> {
    pub fn create(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let device = VirtualDevice::create(path, name, DIAL_IDENTITY, capabilities())?;
        Ok(Self { device })
    }
}

impl<N: DeviceNode> Dial<N> {
    pub fn create_on(node: N, name: &str) -> Result<Self> {
        let device = VirtualDevice::create_on(node, name, DIAL_IDENTITY, capabilities())?;
        Ok(Self { device })
    }

    pub fn device(&self) -> &VirtualDevice<N> {
        &self.device
    }

    /// Positive is clockwise.
    pub fn turn(&self, delta: i32) -> Result<()> {
        self.device.move_relative(&[(REL_DIAL, delta)])
    }

    pub fn close(&self) -> Result<()> {
        self.device.close()
    }
}
