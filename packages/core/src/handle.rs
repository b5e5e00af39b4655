//! Capability-gated file handles and the per-filesystem open-handle table.
//!
//! A handle is a mode tag plus a shared reference to the file's buffer.
//! It holds no contents of its own; every operation delegates to the
//! wrapped buffer after a capability check at the call boundary. An
//! operation outside the granted set fails with `UnsupportedOperation`
//! and mutates nothing.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use crate::buffer;
use crate::error::Error;
use crate::node::{lock_buf, FileBuf};

/// Open mode, determining the capability set and write semantics.
///
/// `Write`, `Append`, and `ReadAppend` insert at the write offset,
/// shifting existing bytes right; `ReadWrite` overwrites in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `r`: read only.
    Read,
    /// `w`: write only, insert-at-offset.
    Write,
    /// `a`: write only, forced append semantics.
    Append,
    /// `rw`: read and overwrite-at-offset.
    ReadWrite,
    /// `ra`: read and insert-at-offset.
    ReadAppend,
}

impl Mode {
    pub fn can_read(self) -> bool {
        matches!(self, Mode::Read | Mode::ReadWrite | Mode::ReadAppend)
    }

    pub fn can_write(self) -> bool {
        !matches!(self, Mode::Read)
    }

    /// Whether writes insert rather than overwrite.
    pub fn inserts(self) -> bool {
        matches!(self, Mode::Write | Mode::Append | Mode::ReadAppend)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Read => "r",
            Mode::Write => "w",
            Mode::Append => "a",
            Mode::ReadWrite => "rw",
            Mode::ReadAppend => "ra",
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "r" => Ok(Mode::Read),
            "w" => Ok(Mode::Write),
            "a" => Ok(Mode::Append),
            "rw" => Ok(Mode::ReadWrite),
            "ra" => Ok(Mode::ReadAppend),
            other => Err(Error::invalid_arguments(format!(
                "unknown open mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability-gated view over one file.
///
/// Clones share the same underlying buffer. Operations lock the file's
/// mutex for their full duration, so concurrent handle operations on one
/// file serialize against each other.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    path: String,
    mode: Mode,
    buf: Option<FileBuf>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, path: impl Into<String>, mode: Mode, buf: FileBuf) -> Self {
        FileHandle {
            name: name.into(),
            path: path.into(),
            mode,
            buf: Some(buf),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn buf(&self) -> Result<&FileBuf, Error> {
        self.buf
            .as_ref()
            .ok_or_else(|| Error::unsupported(format!("{}: handle is closed", self.name)))
    }

    pub fn read(&self, start: usize, end: i64) -> Result<Vec<u8>, Error> {
        if !self.mode.can_read() {
            return Err(Error::unsupported(format!("{}: not readable", self.name)));
        }
        let buf = self.buf()?;
        Ok(buffer::read(&lock_buf(buf), start, end))
    }

    pub fn write(&self, contents: &[u8], start: usize) -> Result<(), Error> {
        if !self.mode.can_write() {
            return Err(Error::unsupported(format!("{}: not writable", self.name)));
        }
        let buf = self.buf()?;
        buffer::write(&mut lock_buf(buf), contents, start, self.mode.inserts());
        Ok(())
    }

    pub fn move_range(&self, start: usize, end: i64, target: usize) -> Result<(), Error> {
        if !self.mode.can_write() {
            return Err(Error::unsupported(format!("{}: not writable", self.name)));
        }
        let buf = self.buf()?;
        buffer::move_range(&mut lock_buf(buf), start, end, target);
        Ok(())
    }

    pub fn truncate(&self, end: usize) -> Result<(), Error> {
        if !self.mode.can_write() {
            return Err(Error::unsupported(format!("{}: not writable", self.name)));
        }
        let buf = self.buf()?;
        buffer::truncate(&mut lock_buf(buf), end);
        Ok(())
    }

    /// Release the reference to the underlying file. Further operations
    /// on this handle fail.
    pub fn close(&mut self) {
        self.buf = None;
    }
}

/// Open-handle table, keyed by file name.
///
/// Shared by every script thread running against one filesystem. An
/// optional capacity caps the number of simultaneously open handles;
/// exceeding it fails the open and leaves the open set unchanged.
/// Re-opening a name already in the table replaces the old entry.
#[derive(Debug)]
pub struct HandleTable {
    inner: Mutex<HashMap<String, FileHandle>>,
    max_open: Option<usize>,
}

impl HandleTable {
    pub fn new() -> Self {
        HandleTable {
            inner: Mutex::new(HashMap::new()),
            max_open: None,
        }
    }

    pub fn with_max_open(max_open: usize) -> Self {
        HandleTable {
            inner: Mutex::new(HashMap::new()),
            max_open: Some(max_open),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, FileHandle>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, handle: FileHandle) -> Result<(), Error> {
        let mut open = self.lock();
        if let Some(max) = self.max_open {
            if open.len() >= max && !open.contains_key(handle.name()) {
                return Err(Error::ResourceExhausted {
                    message: format!("open-handle cap of {} reached", max),
                });
            }
        }
        log::debug!("open {} as {}", handle.name(), handle.mode());
        open.insert(handle.name().to_string(), handle);
        Ok(())
    }

    /// Fetch a clone of the named handle. The clone shares the file's
    /// buffer and lock with the table entry.
    pub fn get(&self, name: &str) -> Result<FileHandle, Error> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    pub fn close(&self, name: &str) -> Result<(), Error> {
        log::debug!("close {}", name);
        match self.lock().remove(name) {
            Some(mut handle) => {
                handle.close();
                Ok(())
            }
            None => Err(Error::not_found(name)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}
