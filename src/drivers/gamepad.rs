use crate::abs::{AbsCalibration, MAX_AXIS_VALUE};
use crate::capabilities::CapabilitySet;
use crate::codes::*;
use crate::config::DeviceIdentity;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::event::InputEventRecord;
use crate::node::{DeviceNode, UinputNode};
use std::path::Path;

pub const GAMEPAD_BUTTONS: [u16; 17] = [
    BTN_SOUTH,
    BTN_EAST,
    BTN_NORTH,
    BTN_WEST,
    BTN_TL,
    BTN_TR,
    BTN_TL2,
    BTN_TR2,
    BTN_SELECT,
    BTN_START,
    BTN_MODE,
    BTN_THUMBL,
    BTN_THUMBR,
    BTN_DPAD_UP,
    BTN_DPAD_DOWN,
    BTN_DPAD_LEFT,
    BTN_DPAD_RIGHT,
];

/// Identity used when the caller does not pick one: an Xbox 360 pad.
pub const GAMEPAD_IDENTITY: DeviceIdentity = DeviceIdentity::usb(0x045e, 0x028e);

/// Two sticks, two analog triggers and a hat.
pub fn capabilities() -> CapabilitySet {
    let stick = AbsCalibration::symmetric(MAX_AXIS_VALUE);
    let trigger = AbsCalibration::one_sided(MAX_AXIS_VALUE);
    let hat = AbsCalibration::symmetric(1);

    CapabilitySet::new()
        .keys(GAMEPAD_BUTTONS)
        .absolute(ABS_X, stick)
        .absolute(ABS_Y, stick)
        .absolute(ABS_RX, stick)
        .absolute(ABS_RY, stick)
        .absolute(ABS_Z, trigger)
        .absolute(ABS_RZ, trigger)
        .absolute(ABS_HAT0X, hat)
        .absolute(ABS_HAT0Y, hat)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatDirection {
    Up,
    Down,
    Left,
    Right,
}

impl HatDirection {
    fn axis(self) -> (u16, i32) {
        match self {
            HatDirection::Up => (ABS_HAT0Y, -1),
            HatDirection::Down => (ABS_HAT0Y, 1),
            HatDirection::Left => (ABS_HAT0X, -1),
            HatDirection::Right => (ABS_HAT0X, 1),
        }
    }
}

/// A virtual gamepad.
///
/// Stick values are in `[-1.0, 1.0]` with positive Y pointing down, trigger
/// values in `[0.0, 1.0]`. Out-of-range values are clamped.
pub struct Gamepad<N: DeviceNode = UinputNode> {
    device: VirtualDevice<N>,
}

impl Gamepad<UinputNode> {
    pub fn create(path: impl AsRef<Path>, name: &str, vendor: u16, product: u16) -> Result<Self> {
        let device = VirtualDevice::create(
            path,
            name,
            DeviceIdentity::usb(vendor, product),
            capabilities(),
        )?;
        Ok(Self { device })
    }
}

impl<N: DeviceNode> Gamepad<N> {
    pub fn create_on(node: N, name: &str, vendor: u16, product: u16) -> Result<Self> {
        let device = VirtualDevice::create_on(
            node,
            name,
            DeviceIdentity::usb(vendor, product),
            capabilities(),
        )?;
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

    pub fn left_stick_move(&self, x: f32, y: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_X, x), (ABS_Y, y)])
    }

    pub fn right_stick_move(&self, x: f32, y: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_RX, x), (ABS_RY, y)])
    }

    pub fn left_stick_move_x(&self, value: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_X, value)])
    }

    pub fn left_stick_move_y(&self, value: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_Y, value)])
    }

    pub fn right_stick_move_x(&self, value: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_RX, value)])
    }

    pub fn right_stick_move_y(&self, value: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_RY, value)])
    }

    pub fn left_trigger(&self, value: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_Z, value)])
    }

    pub fn right_trigger(&self, value: f32) -> Result<()> {
        self.device.move_axes(&[(ABS_RZ, value)])
    }

    pub fn hat_press(&self, direction: HatDirection) -> Result<()> {
        let (code, value) = direction.axis();
        self.device.emit_unchecked(&[InputEventRecord::absolute(code, value)])
    }

    /// Centers the hat axis `direction` lies on.
    pub fn hat_release(&self, direction: HatDirection) -> Result<()> {
        let (code, _) = direction.axis();
        self.device.emit_unchecked(&[InputEventRecord::absolute(code, 0)])
    }

    pub fn close(&self) -> Result<()> {
        self.device.close()
    }
}
