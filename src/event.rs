//! The `struct input_event` record written to a uinput file descriptor.

use crate::codes::{EV_ABS, EV_KEY, EV_MSC, EV_REL, EV_SYN, SYN_REPORT};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;

// The uapi header lays the timestamp out as two `__kernel_ulong_t` words,
// which stay long-sized even where libc's `time_t` is 64-bit on 32-bit targets.
const TIME_SEC_SIZE: usize = mem::size_of::<libc::c_long>();
const TIME_USEC_SIZE: usize = mem::size_of::<libc::c_long>();

/// Size of one encoded record on this platform (24 bytes on 64-bit Linux).
pub const EVENT_SIZE: usize = TIME_SEC_SIZE + TIME_USEC_SIZE + 2 + 2 + 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeVal {
    pub sec: i64,
    pub usec: i64,
}

impl TimeVal {
    pub const ZERO: TimeVal = TimeVal { sec: 0, usec: 0 };
}

/// Key values understood by the kernel.
pub const KEY_RELEASED: i32 = 0;
pub const KEY_PRESSED: i32 = 1;

/// A single input event: timestamp, type, code, value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEventRecord {
    pub time: TimeVal,
    pub ev_type: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEventRecord {
    /// The kernel stamps uinput events on receipt, so records are written with
    /// a zero timestamp.
    pub const fn new(ev_type: u16, code: u16, value: i32) -> Self {
        Self {
            time: TimeVal::ZERO,
            ev_type,
            code,
            value,
        }
    }

    pub const fn key(code: u16, pressed: bool) -> Self {
        Self::new(EV_KEY, code, if pressed { KEY_PRESSED } else { KEY_RELEASED })
    }

    pub const fn absolute(code: u16, value: i32) -> Self {
        Self::new(EV_ABS, code, value)
    }

    pub const fn relative(code: u16, value: i32) -> Self {
        Self::new(EV_REL, code, value)
    }

    pub const fn sync() -> Self {
        Self::new(EV_SYN, SYN_REPORT, 0)
    }

    pub fn is_sync(&self) -> bool {
        self.ev_type == EV_SYN && self.code == SYN_REPORT
    }

    pub fn to_bytes(&self) -> [u8; EVENT_SIZE] {
        let mut buf = [0u8; EVENT_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encodes into `buf` in native byte order.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is not exactly [`EVENT_SIZE`] bytes long.
    pub fn encode_into(&self, buf: &mut [u8]) {
        assert_eq!(
            buf.len(),
            EVENT_SIZE,
            "input event buffer must be {} bytes",
            EVENT_SIZE
        );

        let (sec, rest) = buf.split_at_mut(TIME_SEC_SIZE);
        let (usec, rest) = rest.split_at_mut(TIME_USEC_SIZE);
        sec.copy_from_slice(&(self.time.sec as libc::c_long).to_ne_bytes());
        usec.copy_from_slice(&(self.time.usec as libc::c_long).to_ne_bytes());
        rest[0..2].copy_from_slice(&self.ev_type.to_ne_bytes());
        rest[2..4].copy_from_slice(&self.code.to_ne_bytes());
        rest[4..8].copy_from_slice(&self.value.to_ne_bytes());
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() != EVENT_SIZE {
            return Err(Error::MalformedRecord { len: buf.len() });
        }

        let (sec, rest) = buf.split_at(TIME_SEC_SIZE);
        let (usec, rest) = rest.split_at(TIME_USEC_SIZE);
        let malformed = |_| Error::MalformedRecord { len: buf.len() };

        Ok(Self {
            time: TimeVal {
                sec: libc::c_long::from_ne_bytes(sec.try_into().map_err(malformed)?) as i64,
                usec: libc::c_long::from_ne_bytes(usec.try_into().map_err(malformed)?)
                    as i64,
            },
            ev_type: u16::from_ne_bytes([rest[0], rest[1]]),
            code: u16::from_ne_bytes([rest[2], rest[3]]),
            value: i32::from_ne_bytes([rest[4], rest[5], rest[6], rest[7]]),
        })
    }

    /// Splits a buffer of back-to-back records.
    pub fn decode_all(buf: &[u8]) -> Result<Vec<Self>> {
        if buf.len() % EVENT_SIZE != 0 {
            return Err(Error::MalformedRecord { len: buf.len() });
        }
        buf.chunks_exact(EVENT_SIZE).map(Self::from_bytes).collect()
    }
}

fn type_name(ev_type: u16) -> &'static str {
    match ev_type {
        EV_SYN => "sync",
        EV_KEY => "key",
        EV_REL => "relative",
        EV_ABS => "absolute",
        EV_MSC => "misc",
        _ => "unknown",
    }
}

impl fmt::Display for InputEventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} event (code {:#x}, value {})",
            type_name(self.ev_type),
            self.code,
            self.value
        )
    }
}
