use crate::abs::AbsCalibration;
use crate::codes::{EV_ABS, EV_KEY, EV_MSC, EV_REL, EV_SYN, code_count};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The event codes a device declares, with the calibration of every
/// absolute axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySet {
    keys: BTreeSet<u16>,
    relative: BTreeSet<u16>,
    absolute: BTreeMap<u16, AbsCalibration>,
    misc: BTreeSet<u16>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, code: u16) -> Self {
        self.keys.insert(code);
        self
    }

    pub fn keys(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.keys.extend(codes);
        self
    }

    pub fn relative(mut self, code: u16) -> Self {
        self.relative.insert(code);
        self
    }

    pub fn relatives(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.relative.extend(codes);
        self
    }

    pub fn absolute(mut self, code: u16, calibration: AbsCalibration) -> Self {
        self.absolute.insert(code, calibration);
        self
    }

    pub fn misc(mut self, code: u16) -> Self {
        self.misc.insert(code);
        self
    }

    /// Event types in declaration order. `EV_SYN` is always present.
    pub fn event_types(&self) -> Vec<u16> {
        let mut types = vec![EV_SYN];
        if !self.keys.is_empty() {
            types.push(EV_KEY);
        }
        if !self.relative.is_empty() {
            types.push(EV_REL);
        }
        if !self.absolute.is_empty() {
            types.push(EV_ABS);
        }
        if !self.misc.is_empty() {
            types.push(EV_MSC);
        }
        types
    }

    pub fn key_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.keys.iter().copied()
    }

    pub fn relative_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.relative.iter().copied()
    }

    pub fn misc_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.misc.iter().copied()
    }

    pub fn absolute_axes(&self) -> &BTreeMap<u16, AbsCalibration> {
        &self.absolute
    }

    pub fn has_key(&self, code: u16) -> bool {
        self.keys.contains(&code)
    }

    pub fn has_relative(&self, code: u16) -> bool {
        self.relative.contains(&code)
    }

    pub fn has_misc(&self, code: u16) -> bool {
        self.misc.contains(&code)
    }

    pub fn calibration(&self, code: u16) -> Option<&AbsCalibration> {
        self.absolute.get(&code)
    }

    /// Checks every code against the kernel's table sizes.
    pub fn validate(&self) -> Result<()> {
        let declared = [
            (EV_KEY, &self.keys),
            (EV_REL, &self.relative),
            (EV_MSC, &self.misc),
        ];
        for (ev_type, codes) in declared {
            check_codes(ev_type, codes.iter().copied())?;
        }
        check_codes(EV_ABS, self.absolute.keys().copied())?;
        for (&code, calibration) in &self.absolute {
            if calibration.minimum >= calibration.maximum {
                return Err(Error::InvalidRange {
                    code,
                    minimum: calibration.minimum,
                    maximum: calibration.maximum,
                });
            }
        }
        Ok(())
    }
}

fn check_codes(ev_type: u16, mut codes: impl Iterator<Item = u16>) -> Result<()> {
    let count = code_count(ev_type).unwrap_or(0);
    match codes.find(|&code| code >= count) {
        Some(code) => Err(Error::InvalidCode { ev_type, code }),
        None => Ok(()),
    }
}
