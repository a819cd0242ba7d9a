//! The kernel boundary: a uinput device node and an in-memory stand-in.

use crate::abs::AbsSetup;
use crate::error::{Error, Result};
use crate::event::{EVENT_SIZE, InputEventRecord};
use crate::uinput::{
    UI_ABS_SETUP, UI_DEV_CREATE, UI_DEV_DESTROY, UI_SET_ABSBIT, UI_SET_EVBIT, UI_SET_KEYBIT,
    UI_SET_MSCBIT, UI_SET_RELBIT, UserDevice, ui_get_sysname,
};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// The operations a virtual device needs from the uinput facility.
///
/// Every method maps onto exactly one system call on the device file.
pub trait DeviceNode: Send {
    fn set_evbit(&mut self, ev_type: u16) -> io::Result<()>;
    fn set_keybit(&mut self, code: u16) -> io::Result<()>;
    fn set_relbit(&mut self, code: u16) -> io::Result<()>;
    fn set_absbit(&mut self, code: u16) -> io::Result<()>;
    fn set_mscbit(&mut self, code: u16) -> io::Result<()>;
    fn abs_setup(&mut self, setup: &AbsSetup) -> io::Result<()>;
    /// A single `write(2)`; returns the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    fn dev_create(&mut self) -> io::Result<()>;
    fn dev_destroy(&mut self) -> io::Result<()>;
    /// The kernel-assigned sysfs name, e.g. `input17`.
    fn sysname(&mut self) -> io::Result<String>;
}

/// An open `/dev/uinput` (or compatible) file.
///
/// Closing the file destroys any device created through it.
pub struct UinputNode {
    file: File,
    path: PathBuf,
}

impl UinputNode {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;

        debug!("Opened uinput node {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ioctl_int(&self, request: u64, arg: u16) -> io::Result<()> {
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                request as _,
                libc::c_int::from(arg),
            )
        };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn ioctl_none(&self, request: u64) -> io::Result<()> {
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), request as _) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for UinputNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UinputNode")
            .field("path", &self.path)
            .field("fd", &self.file.as_raw_fd())
            .finish()
    }
}

impl DeviceNode for UinputNode {
    fn set_evbit(&mut self, ev_type: u16) -> io::Result<()> {
        self.ioctl_int(UI_SET_EVBIT, ev_type)
    }

    fn set_keybit(&mut self, code: u16) -> io::Result<()> {
        self.ioctl_int(UI_SET_KEYBIT, code)
    }

    fn set_relbit(&mut self, code: u16) -> io::Result<()> {
        self.ioctl_int(UI_SET_RELBIT, code)
    }

    fn set_absbit(&mut self, code: u16) -> io::Result<()> {
        self.ioctl_int(UI_SET_ABSBIT, code)
    }

    fn set_mscbit(&mut self, code: u16) -> io::Result<()> {
        self.ioctl_int(UI_SET_MSCBIT, code)
    }

    fn abs_setup(&mut self, setup: &AbsSetup) -> io::Result<()> {
        let buf = setup.to_bytes();
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), UI_ABS_SETUP as _, buf.as_ptr()) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn dev_create(&mut self) -> io::Result<()> {
        self.ioctl_none(UI_DEV_CREATE)
    }

    fn dev_destroy(&mut self) -> io::Result<()> {
        self.ioctl_none(UI_DEV_DESTROY)
    }

    fn sysname(&mut self) -> io::Result<String> {
        let mut buf = [0u8; 64];
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                ui_get_sysname(buf.len()) as _,
                buf.as_mut_ptr(),
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }
}

/// A call observed by a [`MemoryNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCall {
    EvBit(u16),
    KeyBit(u16),
    RelBit(u16),
    AbsBit(u16),
    MscBit(u16),
    AbsSetup(AbsSetup),
    Write(Vec<u8>),
    Create,
    Destroy,
    Sysname,
}

type FaultFn = dyn Fn(&NodeCall) -> bool + Send + Sync;

#[derive(Default)]
struct MemoryState {
    calls: Vec<NodeCall>,
    fail_when: Option<Arc<FaultFn>>,
    short_writes: bool,
}

/// A device node that records every call instead of talking to the kernel.
///
/// Clones share one log, so a test can keep a clone while the device owns
/// the other:
///
/// ```
/// use vhid::drivers::Gamepad;
/// use vhid::node::MemoryNode;
///
/// let node = MemoryNode::new();
/// let pad = Gamepad::create_on(node.clone(), "pad", 0xdead, 0xbeef).unwrap();
/// pad.button_press(vhid::codes::BTN_SOUTH).unwrap();
/// assert_eq!(node.events().len(), 4);
/// ```
#[derive(Clone, Default)]
pub struct MemoryNode {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call matching `predicate` fail with `EINVAL`.
    pub fn fail_when(self, predicate: impl Fn(&NodeCall) -> bool + Send + Sync + 'static) -> Self {
        self.lock().fail_when = Some(Arc::new(predicate));
        self
    }

    /// Makes every write accept only half of its buffer.
    pub fn short_writes(self) -> Self {
        self.lock().short_writes = true;
        self
    }

    pub fn calls(&self) -> Vec<NodeCall> {
        self.lock().calls.clone()
    }

    /// Every input event record written so far, in order.
    pub fn events(&self) -> Vec<InputEventRecord> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                NodeCall::Write(buf) if buf.len() == EVENT_SIZE => {
                    InputEventRecord::from_bytes(buf).ok()
                }
                _ => None,
            })
            .collect()
    }

    /// The device descriptor, if one was written.
    pub fn descriptor(&self) -> Option<UserDevice> {
        self.lock().calls.iter().find_map(|call| match call {
            NodeCall::Write(buf) => UserDevice::from_bytes(buf),
            _ => None,
        })
    }

    pub fn is_created(&self) -> bool {
        self.lock().calls.contains(&NodeCall::Create)
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().calls.contains(&NodeCall::Destroy)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: NodeCall) -> io::Result<()> {
        let mut state = self.lock();
        let fails = state.fail_when.as_ref().is_some_and(|f| f(&call));
        state.calls.push(call);
        if fails {
            Err(io::Error::from_raw_os_error(libc::EINVAL))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryNode")
            .field("calls", &self.lock().calls.len())
            .finish()
    }
}

impl DeviceNode for MemoryNode {
    fn set_evbit(&mut self, ev_type: u16) -> io::Result<()> {
        self.record(NodeCall::EvBit(ev_type))
    }

    fn set_keybit(&mut self, code: u16) -> io::Result<()> {
        self.record(NodeCall::KeyBit(code))
    }

    fn set_relbit(&mut self, code: u16) -> io::Result<()> {
        self.record(NodeCall::RelBit(code))
    }

    fn set_absbit(&mut self, code: u16) -> io::Result<()> {
        self.record(NodeCall::AbsBit(code))
    }

    fn set_mscbit(&mut self, code: u16) -> io::Result<()> {
        self.record(NodeCall::MscBit(code))
    }

    fn abs_setup(&mut self, setup: &AbsSetup) -> io::Result<()> {
        self.record(NodeCall::AbsSetup(*setup))
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = if self.lock().short_writes {
            buf.len() / 2
        } else {
            buf.len()
        };
        self.record(NodeCall::Write(buf[..accepted].to_vec()))?;
        Ok(accepted)
    }

    fn dev_create(&mut self) -> io::Result<()> {
        self.record(NodeCall::Create)
    }

    fn dev_destroy(&mut self) -> io::Result<()> {
        self.record(NodeCall::Destroy)
    }

    fn sysname(&mut self) -> io::Result<String> {
        self.record(NodeCall::Sysname)?;
        Ok("input0".to_string())
    }
}
