use crate::abs::AbsCalibration;
use crate::capabilities::CapabilitySet;
use crate::codes::{ABS_X, ABS_Y, BTN_LEFT, BTN_RIGHT, BTN_TOUCH};
use crate::config::DeviceIdentity;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::node::{DeviceNode, UinputNode};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const TOUCHPAD_IDENTITY: DeviceIdentity = DeviceIdentity::usb(0x4711, 0x0817);

/// The coordinate space of a touchpad, usually the screen resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Default for TouchBounds {
    fn default() -> Self {
        Self {
            min_x: 0,
            max_x: 1919,
            min_y: 0,
            max_y: 1079,
        }
    }
}

pub fn capabilities(bounds: TouchBounds) -> CapabilitySet {
    CapabilitySet::new()
        .keys([BTN_LEFT, BTN_RIGHT, BTN_TOUCH])
        .absolute(ABS_X, AbsCalibration::new(bounds.min_x, bounds.max_x))
        .absolute(ABS_Y, AbsCalibration::new(bounds.min_y, bounds.max_y))
}

/// An absolute pointer addressed in raw coordinates within its bounds.
pub struct TouchPad<N: DeviceNode = UinputNode> {
    device: VirtualDevice<N>,
}

impl TouchPad<UinputNode> {
    pub fn create(path: impl AsRef<Path>, name: &str, bounds: TouchBounds) -> Result<Self> {
        let device = VirtualDevice::create(path, name, TOUCHPAD_IDENTITY, capabilities(bounds))?;
        Ok(Self { device })
    }
}

impl<N: DeviceNode> TouchPad<N> {
    pub fn create_on(node: N, name: &str, bounds: TouchBounds) -> Result<Self> {
        let device =
            VirtualDevice::create_on(node, name, TOUCHPAD_IDENTITY, capabilities(bounds))?;
        Ok(Self { device })
    }

    pub fn device(&self) -> &VirtualDevice<N> {
        &self.device
    }

    /// Coordinates outside the bounds are clamped to the nearest edge.
    pub fn move_to(&self, x: i32, y: i32) -> Result<()> {
        let records = [
            self.device.raw_axis_record(ABS_X, x)?,
            self.device.raw_axis_record(ABS_Y, y)?,
        ];
        self.device.emit_unchecked(&records)
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

    pub fn touch_down(&self) -> Result<()> {
        self.device.key_down(BTN_TOUCH)
    }

    pub fn touch_up(&self) -> Result<()> {
        self.device.key_up(BTN_TOUCH)
    }

    pub fn close(&self) -> Result<()> {
        self.device.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::event::InputEventRecord;
    use crate::node::MemoryNode;

    #[test]
    fn move_clamps_to_bounds() {
        let node = MemoryNode::new();
        let pad = TouchPad::create_on(node.clone(), "touch", TouchBounds::default()).unwrap();
        pad.move_to(5000, -20).unwrap();
        assert_eq!(
            node.events(),
            vec![
                InputEventRecord::absolute(ABS_X, 1919),
                InputEventRecord::absolute(ABS_Y, 0),
                InputEventRecord::sync(),
            ]
        );
    }

    #[test]
    fn bounds_reach_the_descriptor() {
        let node = MemoryNode::new();
        let bounds = TouchBounds {
            min_x: -100,
            max_x: 100,
            min_y: 0,
            max_y: 50,
        };
        TouchPad::create_on(node.clone(), "touch", bounds).unwrap();
        let descriptor = node.descriptor().unwrap();
        assert_eq!(descriptor.absmin[ABS_X as usize], -100);
        assert_eq!(descriptor.absmax[ABS_Y as usize], 50);
    }

    #[test]
    fn inverted_bounds_fail_before_registration() {
        let node = MemoryNode::new();
        let bounds = TouchBounds {
            min_x: 10,
            max_x: 0,
            ..TouchBounds::default()
        };
        let err = TouchPad::create_on(node.clone(), "touch", bounds)
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidRange { code: ABS_X, .. }));
        assert!(node.calls().is_empty());
    }
}
