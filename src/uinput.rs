//! uinput ioctl numbers and the `uinput_user_dev` device descriptor.

use crate::abs::{ABS_SETUP_SIZE, AbsCalibration};
use crate::codes::ABS_CNT;
use crate::config::{BusType, DeviceIdentity};
use std::collections::BTreeMap;

pub const UINPUT_IOCTL_BASE: u8 = b'U';

/// Includes the trailing NUL.
pub const UINPUT_MAX_NAME_SIZE: usize = 80;

const IOC_NONE: u64 = 0;
const IOC_WRITE: u64 = 1;
const IOC_READ: u64 = 2;

const IOC_NRSHIFT: u64 = 0;
const IOC_TYPESHIFT: u64 = 8;
const IOC_SIZESHIFT: u64 = 16;
const IOC_DIRSHIFT: u64 = 30;

const fn ioc(dir: u64, nr: u64, size: u64) -> u64 {
    (dir << IOC_DIRSHIFT)
        | ((UINPUT_IOCTL_BASE as u64) << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
        | ((size & 0x3fff) << IOC_SIZESHIFT)
}

const fn io(nr: u64) -> u64 {
    ioc(IOC_NONE, nr, 0)
}

const fn iow(nr: u64, size: usize) -> u64 {
    ioc(IOC_WRITE, nr, size as u64)
}

const INT_SIZE: usize = std::mem::size_of::<libc::c_int>();

pub const UI_DEV_CREATE: u64 = io(1);
pub const UI_DEV_DESTROY: u64 = io(2);
pub const UI_ABS_SETUP: u64 = iow(4, ABS_SETUP_SIZE);
pub const UI_SET_EVBIT: u64 = iow(100, INT_SIZE);
pub const UI_SET_KEYBIT: u64 = iow(101, INT_SIZE);
pub const UI_SET_RELBIT: u64 = iow(102, INT_SIZE);
pub const UI_SET_ABSBIT: u64 = iow(103, INT_SIZE);
pub const UI_SET_MSCBIT: u64 = iow(104, INT_SIZE);

/// `UI_GET_SYSNAME(len)`: reads the sysfs name of the created device.
pub const fn ui_get_sysname(len: usize) -> u64 {
    ioc(IOC_READ, 44, len as u64)
}

/// Size of `struct uinput_user_dev`.
pub const USER_DEV_SIZE: usize = UINPUT_MAX_NAME_SIZE + 8 + 4 + 4 * 4 * ABS_CNT as usize;

/// The legacy device descriptor written to the uinput file just before
/// `UI_DEV_CREATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDevice {
    pub name: [u8; UINPUT_MAX_NAME_SIZE],
    pub identity: DeviceIdentity,
    pub ff_effects_max: u32,
    pub absmax: [i32; ABS_CNT as usize],
    pub absmin: [i32; ABS_CNT as usize],
    pub absfuzz: [i32; ABS_CNT as usize],
    pub absflat: [i32; ABS_CNT as usize],
}

impl UserDevice {
    /// Builds the descriptor. `name` must already be validated to fit with its
    /// terminating NUL; every axis code must be below `ABS_CNT`.
    pub fn new(
        name: &str,
        identity: DeviceIdentity,
        axes: &BTreeMap<u16, AbsCalibration>,
    ) -> Self {
        let mut dev = Self {
            name: [0; UINPUT_MAX_NAME_SIZE],
            identity,
            ff_effects_max: 0,
            absmax: [0; ABS_CNT as usize],
            absmin: [0; ABS_CNT as usize],
            absfuzz: [0; ABS_CNT as usize],
            absflat: [0; ABS_CNT as usize],
        };

        let bytes = name.as_bytes();
        let len = bytes.len().min(UINPUT_MAX_NAME_SIZE - 1);
        dev.name[..len].copy_from_slice(&bytes[..len]);

        for (&code, cal) in axes {
            let i = code as usize;
            dev.absmax[i] = cal.maximum;
            dev.absmin[i] = cal.minimum;
            dev.absfuzz[i] = cal.fuzz;
            dev.absflat[i] = cal.flat;
        }
        dev
    }

    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(USER_DEV_SIZE);
        buf.extend_from_slice(&self.name);
        buf.extend_from_slice(&(self.identity.bustype as u16).to_ne_bytes());
        buf.extend_from_slice(&self.identity.vendor.to_ne_bytes());
        buf.extend_from_slice(&self.identity.product.to_ne_bytes());
        buf.extend_from_slice(&self.identity.version.to_ne_bytes());
        buf.extend_from_slice(&self.ff_effects_max.to_ne_bytes());
        for table in [&self.absmax, &self.absmin, &self.absfuzz, &self.absflat] {
            for value in table.iter() {
                buf.extend_from_slice(&value.to_ne_bytes());
            }
        }
        assert_eq!(buf.len(), USER_DEV_SIZE, "uinput_user_dev size mismatch");
        buf
    }

    /// Parses a descriptor, e.g. one captured by a
    /// [`MemoryNode`](crate::node::MemoryNode). Returns `None` on a size
    /// mismatch.
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != USER_DEV_SIZE {
            return None;
        }

        let u16_at = |at: usize| u16::from_ne_bytes([buf[at], buf[at + 1]]);
        let i32_at = |at: usize| i32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        let mut name = [0u8; UINPUT_MAX_NAME_SIZE];
        name.copy_from_slice(&buf[..UINPUT_MAX_NAME_SIZE]);
        let id = UINPUT_MAX_NAME_SIZE;
        let identity = DeviceIdentity {
            bustype: BusType::from_raw(u16_at(id)),
            vendor: u16_at(id + 2),
            product: u16_at(id + 4),
            version: u16_at(id + 6),
        };
        let ff_effects_max = u32::from_ne_bytes([buf[id + 8], buf[id + 9], buf[id + 10], buf[id + 11]]);

        let mut tables = [[0i32; ABS_CNT as usize]; 4];
        let mut at = id + 12;
        for table in tables.iter_mut() {
            for value in table.iter_mut() {
                *value = i32_at(at);
                at += 4;
            }
        }
        let [absmax, absmin, absfuzz, absflat] = tables;

        Some(Self {
            name,
            identity,
            ff_effects_max,
            absmax,
            absmin,
            absfuzz,
            absflat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{ABS_PRESSURE, ABS_X};

    #[test]
    fn ioctl_numbers_match_kernel_headers() {
        assert_eq!(UI_SET_EVBIT, 0x40045564);
        assert_eq!(UI_SET_KEYBIT, 0x40045565);
        assert_eq!(UI_SET_RELBIT, 0x40045566);
        assert_eq!(UI_SET_ABSBIT, 0x40045567);
        assert_eq!(UI_SET_MSCBIT, 0x40045568);
        assert_eq!(UI_ABS_SETUP, 0x401c5504);
        assert_eq!(UI_DEV_CREATE, 0x5501);
        assert_eq!(UI_DEV_DESTROY, 0x5502);
        assert_eq!(ui_get_sysname(64), 0x8040552c);
    }

    #[test]
    fn descriptor_layout() {
        let mut axes = BTreeMap::new();
        axes.insert(ABS_X, AbsCalibration::symmetric(100).with_fuzz(4).with_flat(8));
        axes.insert(ABS_PRESSURE, AbsCalibration::one_sided(4095));
        let identity = DeviceIdentity {
            bustype: BusType::Usb,
            vendor: 0xdead,
            product: 0xbeef,
            version: 1,
        };

        let dev = UserDevice::new("pad", identity, &axes);
        let bytes = dev.to_bytes();
        assert_eq!(bytes.len(), 1116);
        assert_eq!(&bytes[..4], b"pad\0");
        assert_eq!(&bytes[80..82], &0x03u16.to_ne_bytes());
        assert_eq!(&bytes[82..84], &0xdeadu16.to_ne_bytes());
        assert_eq!(&bytes[84..86], &0xbeefu16.to_ne_bytes());

        // absmax starts right after ff_effects_max
        let absmax_x = 92;
        assert_eq!(&bytes[absmax_x..absmax_x + 4], &100i32.to_ne_bytes());
        let absmin_x = 92 + 256;
        assert_eq!(&bytes[absmin_x..absmin_x + 4], &(-100i32).to_ne_bytes());

        let parsed = UserDevice::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, dev);
        assert_eq!(parsed.name(), "pad");
        assert_eq!(parsed.absmax[ABS_PRESSURE as usize], 4095);
        assert_eq!(parsed.absflat[ABS_X as usize], 8);
    }
}
