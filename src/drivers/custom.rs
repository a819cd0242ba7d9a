use crate::config::DeviceSpec;
use crate::device::VirtualDevice;
use crate::error::Result;
use crate::event::InputEventRecord;
use crate::node::{DeviceNode, UinputNode};
use std::path::Path;

/// A device whose capabilities come from a [`DeviceSpec`] rather than a
/// fixed driver.
pub struct CustomDevice<N: DeviceNode = UinputNode> {
    device: VirtualDevice<N>,
}

impl CustomDevice<UinputNode> {
    pub fn create(path: impl AsRef<Path>, spec: &DeviceSpec) -> Result<Self> {
        let device = VirtualDevice::create(
            path,
            &spec.name,
            spec.identity,
            spec.capabilities.clone(),
        )?;
        Ok(Self { device })
    }
}

impl<N: DeviceNode> CustomDevice<N> {
    pub fn create_on(node: N, spec: &DeviceSpec) -> Result<Self> {
        let device = VirtualDevice::create_on(
            node,
            &spec.name,
            spec.identity,
            spec.capabilities.clone(),
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

    /// Moves any number of calibrated axes in one group.
    pub fn axis_move(&self, axes: &[(u16, f32)]) -> Result<()> {
        self.device.move_axes(axes)
    }

    pub fn relative_move(&self, deltas: &[(u16, i32)]) -> Result<()> {
        self.device.move_relative(deltas)
    }

    /// Writes `records` followed by a sync marker, once every record is known
    /// to fit the description.
    pub fn emit(&self, records: &[InputEventRecord]) -> Result<()> {
        self.device.emit(records)
    }

    pub fn close(&self) -> Result<()> {
        self.device.close()
    }
}
