//! vhid - Virtual HID Devices for Linux
//!
//! This library registers virtual input devices through the kernel's
//! uinput facility and emits input events on their behalf. Drivers for a
//! gamepad, drawing tablet, keyboard, mouse, touchpad and dial are built in;
//! anything else can be described as a [`CapabilitySet`] or a JSON
//! [`DeviceSpec`].

pub mod abs;
pub mod capabilities;
pub mod codes;
pub mod config;
pub mod device;
pub mod drivers;
pub mod emit;
pub mod error;
pub mod event;
pub mod node;
pub mod registration;
pub mod uinput;
pub mod validate;

// Re-export commonly used types
pub use abs::{AbsCalibration, AxisDomain, MAX_AXIS_VALUE};
pub use capabilities::CapabilitySet;
pub use config::{BusType, DEFAULT_UINPUT_PATH, DeviceIdentity, DeviceSpec, default_device_path};
pub use device::VirtualDevice;
pub use drivers::{
    CustomDevice, DeviceKind, Dial, DrawingTablet, Gamepad, HatDirection, Keyboard, Mouse,
    TouchBounds, TouchPad,
};
pub use error::{Error, Result};
pub use event::{InputEventRecord, TimeVal};
pub use node::{DeviceNode, MemoryNode, UinputNode};
