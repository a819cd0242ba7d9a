use crate::capabilities::CapabilitySet;
use crate::codes::{BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, REL_HWHEEL, REL_WHEEL, REL_X, REL_Y};
use crate::config::DeviceIdentity;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::node::{DeviceNode, UinputNode};
use std::path::Path;

pub const MOUSE_IDENTITY: DeviceIdentity = DeviceIdentity::usb(0x4711, 0x0816);

pub fn capabilities() -> CapabilitySet {
    CapabilitySet::new()
        .keys([BTN_LEFT, BTN_RIGHT, BTN_MIDDLE])
        .relatives([REL_X, REL_Y, REL_WHEEL, REL_HWHEEL])
}

/// A relative pointer. Movement is in device units (pixels at default
/// acceleration); positive Y moves down.
pub struct Mouse<N: DeviceNode = UinputNode> {
    device: VirtualDevice<N>,
}

impl Mouse<UinputNode> {
    pub fn create(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let device = VirtualDevice::create(path, name, MOUSE_IDENTITY, capabilities())?;
        Ok(Self { device })
    }
}

impl<N: DeviceNode> Mouse<N> {
    pub fn create_on(node: N, name: &str) -> Result<Self> {
        let device = VirtualDevice::create_on(node, name, MOUSE_IDENTITY, capabilities())?;
        Ok(Self { device })
    }

    pub fn device(&self) -> &VirtualDevice<N> {
        &self.device
    }

    pub fn move_by(&self, dx: i32, dy: i32) -> Result<()> {
        self.device.move_relative(&[(REL_X, dx), (REL_Y, dy)])
    }

    pub fn move_left(&self, pixels: i32) -> Result<()> {
        self.device.move_relative(&[(REL_X, -pixels)])
    }

    pub fn move_right(&self, pixels: i32) -> Result<()> {
        self.device.move_relative(&[(REL_X, pixels)])
    }

    pub fn move_up(&self, pixels: i32) -> Result<()> {
        self.device.move_relative(&[(REL_Y, -pixels)])
    }

    pub fn move_down(&self, pixels: i32) -> Result<()> {
        self.device.move_relative(&[(REL_Y, pixels)])
    }

    /// Scrolls by `delta` detents; positive scrolls up (or right).
    pub fn wheel(&self, horizontal: bool, delta: i32) -> Result<()> {
        let code = if horizontal { REL_HWHEEL } else { REL_WHEEL };
        self.device.move_relative(&[(code, delta)])
    }

    pub fn left_click(&self) -> Result<()> {
        self.device.key_press(BTN_LEFT)
    }

    pub fn left_press(&self) -> Result<()> {
        self.device.key_down(BTN_LEFT)
    }

    pub fn left_release(&self) -> Result<()> {
        self.device.key_up(BTN_LEFT)
    }

    pub fn right_click(&self) -> Result<()> {
        self.device.key_press(BTN_RIGHT)
    }

    pub fn right_press(&self) -> Result<()> {
        self.device.key_down(BTN_RIGHT)
    }

    pub fn right_release(&self) -> Result<()> {
        self.device.key_up(BTN_RIGHT)
    }

    pub fn middle_click(&self) -> Result<()> {
        self.device.key_press(BTN_MIDDLE)
    }

    pub fn middle_press(&self) -> Result<()> {
        self.device.key_down(BTN_MIDDLE)
    }

    pub fn middle_release(&self) -> Result<()> {
        self.device.key_up(BTN_MIDDLE)
    }

    pub fn close(&self) -> Result<()> {
        self.device.close()
    }
}
