//! Absolute-axis calibration and the `uinput_abs_setup` record.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Full-scale value used by the built-in stick, position and pressure axes.
pub const MAX_AXIS_VALUE: i32 = 32767;

/// Size of `struct uinput_abs_setup`: a `u16` code, two bytes of padding and
/// a six-field `input_absinfo`.
pub const ABS_SETUP_SIZE: usize = 28;

/// Range and tolerances the kernel uses to interpret one absolute axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsCalibration {
    pub minimum: i32,
    pub maximum: i32,
    #[serde(default)]
    pub fuzz: i32,
    #[serde(default)]
    pub flat: i32,
    #[serde(default)]
    pub resolution: i32,
}

/// Normalized domain accepted for an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisDomain {
    /// `[-1.0, 1.0]`, for axes whose minimum is negative (sticks, tilt, hats).
    Bipolar,
    /// `[0.0, 1.0]`, for position, pressure and trigger axes.
    Unipolar,
}

impl AbsCalibration {
    pub const fn new(minimum: i32, maximum: i32) -> Self {
        Self {
            minimum,
            maximum,
            fuzz: 0,
            flat: 0,
            resolution: 0,
        }
    }

    /// `[-max, max]`
    pub const fn symmetric(max: i32) -> Self {
        Self::new(-max, max)
    }

    /// `[0, max]`
    pub const fn one_sided(max: i32) -> Self {
        Self::new(0, max)
    }

    pub const fn with_fuzz(mut self, fuzz: i32) -> Self {
        self.fuzz = fuzz;
        self
    }

    pub const fn with_flat(mut self, flat: i32) -> Self {
        self.flat = flat;
        self
    }

    pub const fn with_resolution(mut self, resolution: i32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn domain(&self) -> AxisDomain {
        if self.minimum < 0 {
            AxisDomain::Bipolar
        } else {
            AxisDomain::Unipolar
        }
    }

    /// Scales a normalized value into this axis's integer range.
    ///
    /// Values outside the axis domain are clamped to it. On a bipolar axis
    /// `-1.0`, `0.0` and `1.0` map to `minimum`, `0` and `maximum`; on a
    /// unipolar axis `0.0` and `1.0` map to `minimum` and `maximum`.
    pub fn denormalize(&self, value: f32) -> Result<i32> {
        if value.is_nan() {
            return Err(Error::InvalidValue { value });
        }

        let min = self.minimum as f64;
        let max = self.maximum as f64;
        let scaled = match self.domain() {
            AxisDomain::Bipolar => {
                let v = value.clamp(-1.0, 1.0) as f64;
                if v >= 0.0 { v * max } else { -v * min }
            }
            AxisDomain::Unipolar => {
                let v = value.clamp(0.0, 1.0) as f64;
                min + v * (max - min)
            }
        };

        Ok(scaled.round().clamp(min.min(max), max.max(min)) as i32)
    }

    /// Clamps a raw value into `[minimum, maximum]`.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.minimum.min(self.maximum), self.maximum.max(self.minimum))
    }
}

/// One `UI_ABS_SETUP` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsSetup {
    pub code: u16,
    pub calibration: AbsCalibration,
}

impl AbsSetup {
    pub const fn new(code: u16, calibration: AbsCalibration) -> Self {
        Self { code, calibration }
    }

    pub fn to_bytes(&self) -> [u8; ABS_SETUP_SIZE] {
        let c = &self.calibration;
        let mut buf = [0u8; ABS_SETUP_SIZE];
        buf[0..2].copy_from_slice(&self.code.to_ne_bytes());
        // bytes 2..4 are padding; the initial value is always 0
        let fields = [0, c.minimum, c.maximum, c.fuzz, c.flat, c.resolution];
        for (i, field) in fields.iter().enumerate() {
            let at = 4 + i * 4;
            buf[at..at + 4].copy_from_slice(&field.to_ne_bytes());
        }
        buf
    }

    pub fn from_bytes(buf: &[u8; ABS_SETUP_SIZE]) -> Self {
        let field = |i: usize| {
            let at = 4 + i * 4;
            i32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
        };
        Self {
            code: u16::from_ne_bytes([buf[0], buf[1]]),
            calibration: AbsCalibration {
                minimum: field(1),
                maximum: field(2),
                fuzz: field(3),
                flat: field(4),
                resolution: field(5),
            },
        }
    }
}
