use crate::capabilities::CapabilitySet;
use crate::codes::{EV_ABS, EV_KEY, EV_MSC, EV_REL};
use crate::config::DeviceIdentity;
use crate::emit::emit_group;
use crate::error::{Error, Result};
use crate::event::InputEventRecord;
use crate::node::{DeviceNode, UinputNode};
use crate::registration::register;
use crate::validate::{validate_name, validate_path};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, trace, warn};

/// A registered, kernel-visible input device.
///
/// All writes go through an internal mutex, so one event group (its records
/// and its sync marker) is never interleaved with another thread's group.
/// The device is destroyed by [`close`](Self::close) or when dropped.
pub struct VirtualDevice<N: DeviceNode = UinputNode> {
    name: String,
    identity: DeviceIdentity,
    capabilities: CapabilitySet,
    node: Mutex<Option<N>>,
}

impl VirtualDevice<UinputNode> {
    /// Validates the inputs, opens `path` and registers the device.
    pub fn create(
        path: impl AsRef<Path>,
        name: &str,
        identity: DeviceIdentity,
        capabilities: CapabilitySet,
    ) -> Result<Self> {
        let path = path.as_ref();
        validate_path(path)?;
        validate_name(name)?;
        capabilities.validate()?;

        let node = UinputNode::open(path)?;
        Self::create_on(node, name, identity, capabilities)
    }
}

impl<N: DeviceNode> VirtualDevice<N> {
    /// Registers the device on an already open node.
    pub fn create_on(
        node: N,
        name: &str,
        identity: DeviceIdentity,
        capabilities: CapabilitySet,
    ) -> Result<Self> {
        validate_name(name)?;
        capabilities.validate()?;

        let node = register(node, name, identity, &capabilities)?;
        info!(
            "Created virtual device '{}' ({:04x}:{:04x})",
            name, identity.vendor, identity.product
        );

        Ok(Self {
            name: name.to_string(),
            identity,
            capabilities,
            node: Mutex::new(Some(node)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Writes `records` in order, then one sync marker.
    ///
    /// Every record must use a code the device declared, and absolute
    /// records need a calibrated axis. Sync markers are added here and are
    /// refused in `records`. Nothing is written unless all records pass.
    pub fn emit(&self, records: &[InputEventRecord]) -> Result<()> {
        for record in records {
            self.check_record(record)?;
        }
        self.emit_unchecked(records)
    }

    /// Writes records already built by the `*_record` helpers.
    pub(crate) fn emit_unchecked(&self, records: &[InputEventRecord]) -> Result<()> {
        let mut guard = self.lock();
        let node = guard.as_mut().ok_or(Error::Closed)?;
        trace!("{}: {} records + sync", self.name, records.len());
        emit_group(node, records)
    }

    fn check_record(&self, record: &InputEventRecord) -> Result<()> {
        let caps = &self.capabilities;
        let declared = match record.ev_type {
            EV_KEY => caps.has_key(record.code),
            EV_REL => caps.has_relative(record.code),
            EV_MSC => caps.has_misc(record.code),
            EV_ABS => {
                if caps.calibration(record.code).is_none() {
                    return Err(Error::UncalibratedAxis { code: record.code });
                }
                true
            }
            _ => false,
        };
        if declared {
            Ok(())
        } else {
            Err(Error::UnsupportedCode {
                ev_type: record.ev_type,
                code: record.code,
            })
        }
    }

    /// A key record for a declared key.
    pub fn key_record(&self, code: u16, pressed: bool) -> Result<InputEventRecord> {
        if !self.capabilities.has_key(code) {
            return Err(Error::UnsupportedCode {
                ev_type: EV_KEY,
                code,
            });
        }
        Ok(InputEventRecord::key(code, pressed))
    }

    /// An absolute record with `value` denormalized against the axis
    /// calibration.
    pub fn axis_record(&self, code: u16, value: f32) -> Result<InputEventRecord> {
        let calibration = self
            .capabilities
            .calibration(code)
            .ok_or(Error::UncalibratedAxis { code })?;
        Ok(InputEventRecord::absolute(code, calibration.denormalize(value)?))
    }

    /// An absolute record with a raw value clamped into the calibrated range.
    pub fn raw_axis_record(&self, code: u16, value: i32) -> Result<InputEventRecord> {
        let calibration = self
            .capabilities
            .calibration(code)
            .ok_or(Error::UncalibratedAxis { code })?;
        Ok(InputEventRecord::absolute(code, calibration.clamp(value)))
    }

    pub fn relative_record(&self, code: u16, delta: i32) -> Result<InputEventRecord> {
        if !self.capabilities.has_relative(code) {
            return Err(Error::UnsupportedCode {
                ev_type: EV_REL,
                code,
            });
        }
        Ok(InputEventRecord::relative(code, delta))
    }

    pub fn key_down(&self, code: u16) -> Result<()> {
        self.emit_unchecked(&[self.key_record(code, true)?])
    }

    pub fn key_up(&self, code: u16) -> Result<()> {
        self.emit_unchecked(&[self.key_record(code, false)?])
    }

    /// Press and release, each as its own group.
    pub fn key_press(&self, code: u16) -> Result<()> {
        self.key_down(code)?;
        self.key_up(code)
    }

    /// Moves several absolute axes as one group. Every value is checked
    /// before anything is written.
    pub fn move_axes(&self, axes: &[(u16, f32)]) -> Result<()> {
        let records = axes
            .iter()
            .map(|&(code, value)| self.axis_record(code, value))
            .collect::<Result<Vec<_>>>()?;
        self.emit_unchecked(&records)
    }

    /// Emits several relative deltas as one group.
    pub fn move_relative(&self, deltas: &[(u16, i32)]) -> Result<()> {
        let records = deltas
            .iter()
            .map(|&(code, delta)| self.relative_record(code, delta))
            .collect::<Result<Vec<_>>>()?;
        self.emit_unchecked(&records)
    }

    /// The kernel's name for the device under `/sys/devices/virtual/input`.
    pub fn sysname(&self) -> Result<String> {
        let mut guard = self.lock();
        let node = guard.as_mut().ok_or(Error::Closed)?;
        node.sysname().map_err(Error::Sysname)
    }

    pub fn syspath(&self) -> Result<PathBuf> {
        Ok(Path::new("/sys/devices/virtual/input").join(self.sysname()?))
    }

    /// Destroys the device. Any later call fails with [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        let node = self.lock().take().ok_or(Error::Closed)?;
        release(&self.name, node)
    }

    fn lock(&self) -> MutexGuard<'_, Option<N>> {
        self.node.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn release<N: DeviceNode>(name: &str, mut node: N) -> Result<()> {
    let destroyed = node.dev_destroy();
    drop(node);
    info!("Virtual device '{}' destroyed", name);
    destroyed.map_err(Error::Teardown)
}

impl<N: DeviceNode> Drop for VirtualDevice<N> {
    fn drop(&mut self) {
        let node = self
            .node
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(node) = node {
            if let Err(e) = release(&self.name, node) {
                warn!("Failed to release '{}': {}", self.name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abs::AbsCalibration;
    use crate::codes::{ABS_X, ABS_Y, BTN_LEFT, EV_SYN, REL_X};
    use crate::node::{MemoryNode, NodeCall};
    use std::sync::Arc;
    use std::thread;

    fn device(node: &MemoryNode) -> VirtualDevice<MemoryNode> {
        let caps = CapabilitySet::new()
            .key(BTN_LEFT)
            .relative(REL_X)
            .absolute(ABS_X, AbsCalibration::symmetric(100))
            .absolute(ABS_Y, AbsCalibration::symmetric(100));
        VirtualDevice::create_on(node.clone(), "dev", DeviceIdentity::usb(1, 2), caps).unwrap()
    }

    fn after_create(node: &MemoryNode) -> Vec<NodeCall> {
        let calls = node.calls();
        let at = calls.iter().position(|c| *c == NodeCall::Create).unwrap();
        calls[at + 1..].to_vec()
    }

    #[test]
    fn uncalibrated_axis_is_rejected_without_writing() {
        let node = MemoryNode::new();
        let dev = device(&node);
        let err = dev.move_axes(&[(ABS_X, 0.5), (0x02, 0.5)]).unwrap_err();
        assert!(matches!(err, Error::UncalibratedAxis { code: 0x02 }));
        assert!(after_create(&node).is_empty());
    }

    #[test]
    fn undeclared_key_is_rejected() {
        let node = MemoryNode::new();
        let dev = device(&node);
        assert!(matches!(
            dev.key_down(0x111),
            Err(Error::UnsupportedCode { ev_type: EV_KEY, code: 0x111 })
        ));
    }

    #[test]
    fn redundant_key_events_are_passed_through() {
        let node = MemoryNode::new();
        let dev = device(&node);
        dev.key_down(BTN_LEFT).unwrap();
        dev.key_down(BTN_LEFT).unwrap();
        assert_eq!(node.events().len(), 4);
    }

    #[test]
    fn close_destroys_once_and_later_calls_fail() {
        let node = MemoryNode::new();
        let dev = device(&node);
        dev.close().unwrap();

        assert!(dev.is_closed());
        assert!(matches!(dev.close(), Err(Error::Closed)));
        assert!(matches!(dev.key_press(BTN_LEFT), Err(Error::Closed)));
        assert!(matches!(dev.sysname(), Err(Error::Closed)));
        drop(dev);

        let destroys = node.calls().iter().filter(|c| **c == NodeCall::Destroy).count();
        assert_eq!(destroys, 1);
    }

    #[test]
    fn drop_releases_an_open_device() {
        let node = MemoryNode::new();
        drop(device(&node));
        assert!(node.is_destroyed());
    }

    #[test]
    fn syspath_uses_sysname() {
        let node = MemoryNode::new();
        let dev = device(&node);
        assert_eq!(
            dev.syspath().unwrap(),
            PathBuf::from("/sys/devices/virtual/input/input0")
        );
    }

    #[test]
    fn concurrent_groups_do_not_interleave() {
        let node = MemoryNode::new();
        let dev = Arc::new(device(&node));

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let dev = Arc::clone(&dev);
                thread::spawn(move || {
                    for _ in 0..25 {
                        dev.move_axes(&[(ABS_X, i as f32 / 4.0), (ABS_Y, i as f32 / 4.0)])
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let events = node.events();
        assert_eq!(events.len(), 4 * 25 * 3);
        for group in events.chunks(3) {
            assert_eq!(group[0].code, ABS_X);
            assert_eq!(group[1].code, ABS_Y);
            assert_eq!(group[0].value, group[1].value);
            assert!(group[2].is_sync());
        }
    }

    #[test]
    fn emit_checks_every_record_before_writing() {
        let node = MemoryNode::new();
        let dev = device(&node);

        let err = dev
            .emit(&[
                InputEventRecord::absolute(ABS_X, 5),
                InputEventRecord::absolute(0x02, 5),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::UncalibratedAxis { code: 0x02 }));

        let err = dev
            .emit(&[InputEventRecord::relative(REL_X, 1), InputEventRecord::key(0x111, true)])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCode { ev_type: EV_KEY, code: 0x111 }));

        let err = dev
            .emit(&[InputEventRecord::key(BTN_LEFT, true), InputEventRecord::sync()])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCode { ev_type: EV_SYN, code: 0 }));

        assert!(after_create(&node).is_empty());
    }

    #[test]
    fn emit_passes_declared_records_through() {
        let node = MemoryNode::new();
        let dev = device(&node);
        dev.emit(&[InputEventRecord::absolute(ABS_Y, -7), InputEventRecord::key(BTN_LEFT, true)])
            .unwrap();
        assert_eq!(
            node.events(),
            vec![
                InputEventRecord::absolute(ABS_Y, -7),
                InputEventRecord::key(BTN_LEFT, true),
                InputEventRecord::sync(),
            ]
        );
    }

    #[test]
    fn relative_deltas_share_one_sync() {
        let node = MemoryNode::new();
        let dev = device(&node);
        dev.move_relative(&[(REL_X, -3)]).unwrap();
        assert_eq!(
            node.events(),
            vec![InputEventRecord::relative(REL_X, -3), InputEventRecord::sync()]
        );
    }
}
