//! The ordered capability-declaration sequence that turns an open uinput node
//! into a kernel-visible device.
//!
//! Event types are declared first, then key, relative and misc codes, then
//! each absolute axis followed immediately by its calibration. The descriptor
//! write and `UI_DEV_CREATE` come last. A [`Registrar`] refuses a code whose
//! event type has not been declared and refuses to finish while a declared
//! axis lacks calibration, before any of those calls reach the node.

use crate::abs::{AbsCalibration, AbsSetup};
use crate::capabilities::CapabilitySet;
use crate::codes::{ABS_CNT, EV_ABS, EV_KEY, EV_MSC, EV_REL};
use crate::config::DeviceIdentity;
use crate::error::{Error, Result, Step};
use crate::node::DeviceNode;
use crate::uinput::UserDevice;
use crate::validate::validate_name;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub struct Registrar<N: DeviceNode> {
    node: N,
    event_types: BTreeSet<u16>,
    declared_axes: BTreeSet<u16>,
    calibrations: BTreeMap<u16, AbsCalibration>,
}

impl<N: DeviceNode> Registrar<N> {
    pub fn new(node: N) -> Self {
        Self {
            node,
            event_types: BTreeSet::new(),
            declared_axes: BTreeSet::new(),
            calibrations: BTreeMap::new(),
        }
    }

    pub fn enable_event_type(&mut self, ev_type: u16) -> Result<()> {
        let step = Step::EventType(ev_type);
        debug!("{}", step);
        self.node
            .set_evbit(ev_type)
            .map_err(|source| Error::Registration { step, source })?;
        self.event_types.insert(ev_type);
        Ok(())
    }

    pub fn enable_key(&mut self, code: u16) -> Result<()> {
        let step = Step::Key(code);
        self.require(EV_KEY, step)?;
        self.node
            .set_keybit(code)
            .map_err(|source| Error::Registration { step, source })
    }

    pub fn enable_relative(&mut self, code: u16) -> Result<()> {
        let step = Step::Relative(code);
        self.require(EV_REL, step)?;
        self.node
            .set_relbit(code)
            .map_err(|source| Error::Registration { step, source })
    }

    pub fn enable_misc(&mut self, code: u16) -> Result<()> {
        let step = Step::Misc(code);
        self.require(EV_MSC, step)?;
        self.node
            .set_mscbit(code)
            .map_err(|source| Error::Registration { step, source })
    }

    pub fn enable_absolute(&mut self, code: u16) -> Result<()> {
        let step = Step::Absolute(code);
        self.require(EV_ABS, step)?;
        if code >= ABS_CNT {
            return Err(Error::InvalidCode {
                ev_type: EV_ABS,
                code,
            });
        }
        self.node
            .set_absbit(code)
            .map_err(|source| Error::Registration { step, source })?;
        self.declared_axes.insert(code);
        Ok(())
    }

    /// Registers the calibration of an axis already declared with
    /// [`enable_absolute`](Self::enable_absolute).
    pub fn setup_absolute(&mut self, code: u16, calibration: AbsCalibration) -> Result<()> {
        let step = Step::AbsSetup(code);
        self.require(EV_ABS, step)?;
        if !self.declared_axes.contains(&code) {
            return Err(Error::UndeclaredAxis { code });
        }
        debug!(
            "{}: [{}, {}] fuzz={} flat={} res={}",
            step,
            calibration.minimum,
            calibration.maximum,
            calibration.fuzz,
            calibration.flat,
            calibration.resolution
        );
        self.node
            .abs_setup(&AbsSetup::new(code, calibration))
            .map_err(|source| Error::Registration { step, source })?;
        self.calibrations.insert(code, calibration);
        Ok(())
    }

    /// Writes the device descriptor and creates the device.
    ///
    /// Returns the node, now backing a live device.
    pub fn finish(mut self, name: &str, identity: DeviceIdentity) -> Result<N> {
        validate_name(name)?;
        if let Some(&code) = self.calibrations.keys().find(|&&code| code >= ABS_CNT) {
            return Err(Error::InvalidCode {
                ev_type: EV_ABS,
                code,
            });
        }
        if let Some(&code) = self
            .declared_axes
            .iter()
            .find(|&&code| !self.calibrations.contains_key(&code))
        {
            return Err(Error::UncalibratedAxis { code });
        }

        let descriptor = UserDevice::new(name, identity, &self.calibrations).to_bytes();
        debug!("{} ({} bytes)", Step::Descriptor, descriptor.len());
        let written = self
            .node
            .write(&descriptor)
            .map_err(|source| Error::Registration {
                step: Step::Descriptor,
                source,
            })?;
        if written != descriptor.len() {
            return Err(Error::ShortWrite {
                what: "device descriptor".to_string(),
                written,
                expected: descriptor.len(),
            });
        }

        debug!("{}", Step::Create);
        self.node.dev_create().map_err(|source| Error::Registration {
            step: Step::Create,
            source,
        })?;
        Ok(self.node)
    }

    fn require(&self, ev_type: u16, step: Step) -> Result<()> {
        if self.event_types.contains(&ev_type) {
            Ok(())
        } else {
            Err(Error::OutOfOrder { step, ev_type })
        }
    }
}

/// Runs the whole sequence for a capability set.
///
/// The set is validated before the node sees any call.
///
/// On failure the node is dropped, which closes the file and discards the
/// half-configured device.
pub fn register<N: DeviceNode>(
    node: N,
    name: &str,
    identity: DeviceIdentity,
    capabilities: &CapabilitySet,
) -> Result<N> {
    capabilities.validate()?;
    let mut registrar = Registrar::new(node);

    for ev_type in capabilities.event_types() {
        registrar.enable_event_type(ev_type)?;
    }
    for code in capabilities.key_codes() {
        registrar.enable_key(code)?;
    }
    for code in capabilities.relative_codes() {
        registrar.enable_relative(code)?;
    }
    for code in capabilities.misc_codes() {
        registrar.enable_misc(code)?;
    }
    for (&code, &calibration) in capabilities.absolute_axes() {
        registrar.enable_absolute(code)?;
        registrar.setup_absolute(code, calibration)?;
    }

    registrar.finish(name, identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{ABS_X, ABS_Y, BTN_LEFT, EV_SYN, MSC_TIMESTAMP, REL_WHEEL};
    use crate::node::{MemoryNode, NodeCall};

    fn identity() -> DeviceIdentity {
        DeviceIdentity::usb(0x1234, 0x5678)
    }

    #[test]
    fn declarations_are_issued_in_order() {
        let node = MemoryNode::new();
        let caps = CapabilitySet::new()
            .key(BTN_LEFT)
            .relative(REL_WHEEL)
            .misc(MSC_TIMESTAMP)
            .absolute(ABS_X, AbsCalibration::one_sided(100));

        register(node.clone(), "test", identity(), &caps).unwrap();

        let calls = node.calls();
        assert_eq!(
            &calls[..9],
            &[
                NodeCall::EvBit(EV_SYN),
                NodeCall::EvBit(EV_KEY),
                NodeCall::EvBit(EV_REL),
                NodeCall::EvBit(EV_ABS),
                NodeCall::EvBit(EV_MSC),
                NodeCall::KeyBit(BTN_LEFT),
                NodeCall::RelBit(REL_WHEEL),
                NodeCall::MscBit(MSC_TIMESTAMP),
                NodeCall::AbsBit(ABS_X),
            ]
        );
        assert_eq!(
            calls[9],
            NodeCall::AbsSetup(AbsSetup::new(ABS_X, AbsCalibration::one_sided(100)))
        );
        assert!(matches!(calls[10], NodeCall::Write(_)));
        assert_eq!(calls[11], NodeCall::Create);
        assert_eq!(calls.len(), 12);

        let descriptor = node.descriptor().unwrap();
        assert_eq!(descriptor.name(), "test");
        assert_eq!(descriptor.absmax[ABS_X as usize], 100);
    }

    #[test]
    fn axis_setup_without_event_type_fails_before_touching_node() {
        let node = MemoryNode::new();
        let mut registrar = Registrar::new(node.clone());
        registrar.enable_event_type(EV_SYN).unwrap();

        let err = registrar
            .setup_absolute(ABS_X, AbsCalibration::one_sided(1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfOrder {
                step: Step::AbsSetup(ABS_X),
                ev_type: EV_ABS
            }
        ));
        assert_eq!(node.calls(), vec![NodeCall::EvBit(EV_SYN)]);
    }

    #[test]
    fn key_before_event_type_is_out_of_order() {
        let mut registrar = Registrar::new(MemoryNode::new());
        assert!(matches!(
            registrar.enable_key(BTN_LEFT),
            Err(Error::OutOfOrder { ev_type: EV_KEY, .. })
        ));
    }

    #[test]
    fn setup_of_undeclared_axis_is_rejected() {
        let node = MemoryNode::new();
        let mut registrar = Registrar::new(node.clone());
        registrar.enable_event_type(EV_ABS).unwrap();
        registrar.enable_absolute(ABS_X).unwrap();

        let err = registrar
            .setup_absolute(ABS_Y, AbsCalibration::one_sided(1))
            .unwrap_err();
        assert!(matches!(err, Error::UndeclaredAxis { code: ABS_Y }));
        assert!(err.to_string().contains("axis 0x01"));
        assert!(!err.to_string().contains("event type"));
        assert_eq!(node.calls().len(), 2);
    }

    #[test]
    fn axis_past_the_table_is_rejected_before_any_call() {
        let node = MemoryNode::new();
        let caps = CapabilitySet::new().absolute(ABS_CNT, AbsCalibration::one_sided(1));

        let err = register(node.clone(), "dev", identity(), &caps).unwrap_err();
        assert!(matches!(err, Error::InvalidCode { ev_type: EV_ABS, code: 0x40 }));
        assert!(node.calls().is_empty());
    }

    #[test]
    fn registrar_refuses_axis_past_the_table() {
        let node = MemoryNode::new();
        let mut registrar = Registrar::new(node.clone());
        registrar.enable_event_type(EV_ABS).unwrap();

        let err = registrar.enable_absolute(ABS_CNT).unwrap_err();
        assert!(matches!(err, Error::InvalidCode { ev_type: EV_ABS, code: 0x40 }));
        assert_eq!(node.calls(), vec![NodeCall::EvBit(EV_ABS)]);
    }

    #[test]
    fn finish_checks_the_name() {
        let node = MemoryNode::new();
        let mut registrar = Registrar::new(node.clone());
        registrar.enable_event_type(EV_KEY).unwrap();
        let err = registrar.finish(&"n".repeat(80), identity()).unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));

        let err = Registrar::new(node.clone()).finish("", identity()).unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
        assert!(node.descriptor().is_none());
        assert!(!node.is_created());
    }

    #[test]
    fn finishing_with_uncalibrated_axis_fails_before_create() {
        let node = MemoryNode::new();
        let mut registrar = Registrar::new(node.clone());
        registrar.enable_event_type(EV_ABS).unwrap();
        registrar.enable_absolute(ABS_Y).unwrap();

        let err = registrar.finish("dev", identity()).unwrap_err();
        assert!(matches!(err, Error::UncalibratedAxis { code: ABS_Y }));
        assert!(node.descriptor().is_none());
        assert!(!node.is_created());
    }

    #[test]
    fn failing_step_is_named_and_aborts() {
        let node = MemoryNode::new().fail_when(|call| *call == NodeCall::AbsBit(ABS_Y));
        let caps = CapabilitySet::new()
            .absolute(ABS_X, AbsCalibration::one_sided(1))
            .absolute(ABS_Y, AbsCalibration::one_sided(1));

        let err = register(node.clone(), "dev", identity(), &caps).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration {
                step: Step::Absolute(ABS_Y),
                ..
            }
        ));
        assert!(err.to_string().contains("absolute axis 0x01"));
        assert!(!node.is_created());
    }

    #[test]
    fn short_descriptor_write_is_an_error() {
        let node = MemoryNode::new().short_writes();
        let err = register(node.clone(), "dev", identity(), &CapabilitySet::new()).unwrap_err();
        assert!(matches!(err, Error::ShortWrite { .. }));
        assert!(!node.is_created());
    }
}
