use crate::event::InputEventRecord;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// One call of the registration sequence, used to say which step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    EventType(u16),
    Key(u16),
    Relative(u16),
    Absolute(u16),
    AbsSetup(u16),
    Misc(u16),
    Descriptor,
    Create,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::EventType(ev) => write!(f, "declare event type {:#04x}", ev),
            Step::Key(code) => write!(f, "declare key {:#05x}", code),
            Step::Relative(code) => write!(f, "declare relative axis {:#04x}", code),
            Step::Absolute(code) => write!(f, "declare absolute axis {:#04x}", code),
            Step::AbsSetup(code) => write!(f, "set up absolute axis {:#04x}", code),
            Step::Misc(code) => write!(f, "declare misc code {:#04x}", code),
            Step::Descriptor => f.write_str("write device descriptor"),
            Step::Create => f.write_str("create device"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid device path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    #[error("invalid device name: {0}")]
    InvalidName(String),

    #[error("code {code:#x} is out of range for event type {ev_type:#04x}")]
    InvalidCode { ev_type: u16, code: u16 },

    #[error("code {code:#x} of event type {ev_type:#04x} is not declared by this device")]
    UnsupportedCode { ev_type: u16, code: u16 },

    #[error("absolute axis {code:#04x} has an empty range [{minimum}, {maximum}]")]
    InvalidRange {
        code: u16,
        minimum: i32,
        maximum: i32,
    },

    #[error("absolute axis {code:#04x} has no calibration")]
    UncalibratedAxis { code: u16 },

    #[error("normalized value {value} is not a number")]
    InvalidValue { value: f32 },

    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("registration failed: {step}")]
    Registration {
        step: Step,
        #[source]
        source: io::Error,
    },

    #[error("cannot {step}: event type {ev_type:#04x} was not declared first")]
    OutOfOrder { step: Step, ev_type: u16 },

    #[error("cannot set up absolute axis {code:#04x}: the axis was not declared first")]
    UndeclaredAxis { code: u16 },

    #[error("failed to write {record}")]
    Write {
        record: InputEventRecord,
        #[source]
        source: io::Error,
    },

    #[error("short write of {what}: {written} of {expected} bytes")]
    ShortWrite {
        what: String,
        written: usize,
        expected: usize,
    },

    #[error("failed to query the device's sysfs name")]
    Sysname(#[source] io::Error),

    #[error("failed to destroy device")]
    Teardown(#[source] io::Error),

    #[error("device is closed")]
    Closed,

    #[error("malformed input event record: {len} bytes")]
    MalformedRecord { len: usize },
}
