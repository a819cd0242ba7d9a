use crate::abs::{AbsCalibration, MAX_AXIS_VALUE};
use crate::capabilities::CapabilitySet;
use crate::codes::*;
use crate::config::DeviceIdentity;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::node::{DeviceNode, UinputNode};
use std::path::Path;

pub const TABLET_IDENTITY: DeviceIdentity = DeviceIdentity::usb(0x4711, 0x0818);

pub const TABLET_TOOLS: [u16; 9] = [
    BTN_TOOL_PEN,
    BTN_TOOL_RUBBER,
    BTN_TOUCH,
    BTN_STYLUS,
    BTN_TOOL_FINGER,
    BTN_TOOL_DOUBLETAP,
    BTN_TOOL_TRIPLETAP,
    BTN_TOOL_QUADTAP,
    BTN_TOOL_QUINTTAP,
];

/// Tilt is reported in degrees.
pub const TILT_RANGE: i32 = 90;

pub fn capabilities() -> CapabilitySet {
    let surface = AbsCalibration::one_sided(MAX_AXIS_VALUE).with_resolution(12);
    let tilt = AbsCalibration::symmetric(TILT_RANGE).with_resolution(12);

    CapabilitySet::new()
        .keys(TABLET_TOOLS)
        .misc(MSC_TIMESTAMP)
        .absolute(ABS_X, surface)
        .absolute(ABS_Y, surface)
        .absolute(ABS_PRESSURE, surface)
        .absolute(ABS_TILT_X, tilt)
        .absolute(ABS_TILT_Y, tilt)
}

/// A pen tablet: tool buttons, an absolute position in `[0.0, 1.0]`,
/// pressure in `[0.0, 1.0]` and tilt in `[-1.0, 1.0]`.
pub struct DrawingTablet<N: DeviceNode = UinputNode> {
    device: VirtualDevice<N>,
}

impl DrawingTablet<UinputNode> {
    pub fn create(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let device = VirtualDevice::create(path, name, TABLET_IDENTITY, capabilities())?;
        Ok(Self { device })
    }
}

impl<N: DeviceNode> DrawingTablet<N> {
    pub fn create_on(node: N, name: &str) -> Result<Self> {
        let device = VirtualDevice::create_on(node, name, TABLET_IDENTITY, capabilities())?;
        Ok(Self { device })
    }

    pub fn device(&self) -> &VirtualDevice<N> {
        &self.device
    }

    pub fn button_press(&self, button: u16) -> Result<()> {
        self.device.key_press(button)
    }

    pub fn button_down(&self, button: u16) -> Result<()> {
        self.device.key_down(button)
    }

    pub fn button_up(&self, button: u16) -> Result<()> {
        self.device.key_up(button)
    }

    pub fn move_to(&self, x: f32, y: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_X, x), (ABS_Y, y)])
    }

    pub fn pressure(&self, pressure: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_PRESSURE, pressure)])
    }

    pub fn tilt(&self, x: f32, y: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_TILT_X, x), (ABS_TILT_Y, y)])
    }

    pub fn close(&self) -> Result<()> {
        self.device.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputEventRecord;
    use crate::node::{MemoryNode, NodeCall};

    #[test]
    fn declares_timestamp_under_misc() {
        let node = MemoryNode::new();
        let _tablet = DrawingTablet::create_on(node.clone(), "pen").unwrap();
        let calls = node.calls();

        let ev_msc = calls.iter().position(|c| *c == NodeCall::EvBit(EV_MSC)).unwrap();
        let msc = calls
            .iter()
            .position(|c| *c == NodeCall::MscBit(MSC_TIMESTAMP))
            .unwrap();
        assert!(ev_msc < msc);
    }

    #[test]
    fn tilt_spans_both_directions() {
        let node = MemoryNode::new();
        let tablet = DrawingTablet::create_on(node.clone(), "pen").unwrap();
        tablet.tilt(-1.0, 0.5).unwrap();
        assert_eq!(
            node.events(),
            vec![
                InputEventRecord::absolute(ABS_TILT_X, -90),
                InputEventRecord::absolute(ABS_TILT_Y, 45),
                InputEventRecord::sync(),
            ]
        );
    }

    #[test]
    fn pen_stroke() {
        let node = MemoryNode::new();
        let tablet = DrawingTablet::create_on(node.clone(), "pen").unwrap();
        tablet.button_down(BTN_TOOL_PEN).unwrap();
        tablet.move_to(0.0, 0.0).unwrap();
        tablet.pressure(0.25).unwrap();
        tablet.button_up(BTN_TOOL_PEN).unwrap();

        let events = node.events();
        assert_eq!(events.len(), 2 + 3 + 2 + 2);
        assert_eq!(events[5], InputEventRecord::absolute(ABS_PRESSURE, 8192));
    }
}
