//! Client-side proxies over a remote authoritative tree.
//!
//! `RemoteFs` presents the same [`TreeOps`] contract as a local
//! [`treefs_core::FileSystem`]; folder- and file-returning calls wrap the
//! deserialized view in a proxy carrying the connection factory, so
//! further calls go back to the server. Proxies are stateless snapshots:
//! a `RemoteFolder` reflects the tree at the moment of the call and is
//! not kept live-updated.

use treefs_core::{Error, FileView, FolderView, MemoryMap, Mode, TreeOps};
use treefs_wire::{Command, Request};

use crate::connector::Connector;

/// Proxy for the filesystem aggregate.
#[derive(Debug, Clone)]
pub struct RemoteFs {
    connector: Connector,
}

impl RemoteFs {
    /// Target a server; no connection is opened until the first call.
    pub fn connect(addr: impl Into<String>) -> Self {
        RemoteFs {
            connector: Connector::new(addr),
        }
    }

    /// The server address every call targets.
    pub fn addr(&self) -> &str {
        self.connector.addr()
    }

    /// Change directory and keep the result as a folder proxy.
    pub fn enter(&self, path: &str) -> Result<RemoteFolder, Error> {
        Ok(RemoteFolder {
            connector: self.connector.clone(),
            view: self.change_directory(path)?,
        })
    }

    /// The root folder as a proxy.
    pub fn root_folder(&self) -> Result<RemoteFolder, Error> {
        Ok(RemoteFolder {
            connector: self.connector.clone(),
            view: self.root()?,
        })
    }

    /// The current working folder as a proxy.
    pub fn current_folder(&self) -> Result<RemoteFolder, Error> {
        Ok(RemoteFolder {
            connector: self.connector.clone(),
            view: self.current()?,
        })
    }
}

impl TreeOps for RemoteFs {
    fn change_directory(&self, path: &str) -> Result<FolderView, Error> {
        self.connector
            .call_value(&Request::new(Command::ChangeDirectory, [path]))
    }

    fn create_directory(&self, path: &str) -> Result<(), Error> {
        self.connector
            .call(&Request::new(Command::CreateDirectory, [path]))?;
        Ok(())
    }

    fn move_node(&self, src: &str, dest: &str) -> Result<(), Error> {
        self.connector
            .call(&Request::new(Command::Move, [src, dest]))?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        self.connector
            .call(&Request::new(Command::Delete, [path]))?;
        Ok(())
    }

    fn save(&self) -> Result<(), Error> {
        self.connector
            .call(&Request::new(Command::Save, Vec::<String>::new()))?;
        Ok(())
    }

    fn memory_map(&self) -> Result<MemoryMap, Error> {
        self.connector
            .call_value(&Request::new(Command::MemoryMap, Vec::<String>::new()))
    }

    fn root(&self) -> Result<FolderView, Error> {
        self.connector
            .call_value(&Request::new(Command::Root, Vec::<String>::new()))
    }

    fn current(&self) -> Result<FolderView, Error> {
        self.connector
            .call_value(&Request::new(Command::Current, Vec::<String>::new()))
    }
}

/// Proxy for one folder, addressed by the path snapshot it was built
/// from.
#[derive(Debug, Clone)]
pub struct RemoteFolder {
    connector: Connector,
    view: FolderView,
}

impl RemoteFolder {
    pub fn view(&self) -> &FolderView {
        &self.view
    }

    pub fn name(&self) -> &str {
        &self.view.name
    }

    pub fn path(&self) -> &str {
        &self.view.path
    }

    /// Create an empty file in this folder.
    pub fn create_file(&self, name: &str) -> Result<(), Error> {
        self.connector
            .call(&Request::new(Command::CreateFile, [self.path(), name]))?;
        Ok(())
    }

    /// Open a file in this folder, wrapping the returned snapshot in a
    /// file proxy gated by `mode`.
    pub fn open_file(&self, name: &str, mode: &str) -> Result<RemoteFile, Error> {
        let parsed: Mode = mode.parse()?;
        let view: FileView = self
            .connector
            .call_value(&Request::new(Command::OpenFile, [self.path(), name, mode]))?;
        Ok(RemoteFile {
            connector: self.connector.clone(),
            dir: self.path().to_string(),
            mode: parsed,
            view,
        })
    }

    /// Delete a file in this folder.
    pub fn delete_file(&self, name: &str) -> Result<(), Error> {
        self.connector
            .call(&Request::new(Command::DeleteFile, [self.path(), name]))?;
        Ok(())
    }
}

/// Proxy for one file.
///
/// Capability checks run client-side, against the mode the file was
/// opened with, before any request goes out; each permitted operation is
/// one discrete round trip.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    connector: Connector,
    /// Path of the containing folder, used to address content commands.
    dir: String,
    mode: Mode,
    view: FileView,
}

impl RemoteFile {
    pub fn view(&self) -> &FileView {
        &self.view
    }

    pub fn name(&self) -> &str {
        &self.view.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn read(&self, start: usize, end: i64) -> Result<Vec<u8>, Error> {
        if !self.mode.can_read() {
            return Err(Error::unsupported(format!("{}: not readable", self.name())));
        }
        self.connector.call_value(&Request::new(
            Command::ReadContents,
            [
                self.dir.clone(),
                self.view.name.clone(),
                start.to_string(),
                end.to_string(),
            ],
        ))
    }

    pub fn write(&self, contents: &str, start: usize) -> Result<(), Error> {
        if !self.mode.can_write() {
            return Err(Error::unsupported(format!("{}: not writable", self.name())));
        }
        self.connector.call(&Request::new(
            Command::WriteContents,
            [
                self.dir.clone(),
                self.view.name.clone(),
                contents.to_string(),
                start.to_string(),
                self.mode.inserts().to_string(),
            ],
        ))?;
        Ok(())
    }

    pub fn move_range(&self, start: usize, end: i64, target: usize) -> Result<(), Error> {
        if !self.mode.can_write() {
            return Err(Error::unsupported(format!("{}: not writable", self.name())));
        }
        self.connector.call(&Request::new(
            Command::MoveContents,
            [
                self.dir.clone(),
                self.view.name.clone(),
                start.to_string(),
                end.to_string(),
                target.to_string(),
            ],
        ))?;
        Ok(())
    }

    pub fn truncate(&self, end: usize) -> Result<(), Error> {
        if !self.mode.can_write() {
            return Err(Error::unsupported(format!("{}: not writable", self.name())));
        }
        self.connector.call(&Request::new(
            Command::TruncateContents,
            [self.dir.clone(), self.view.name.clone(), end.to_string()],
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Capability checks fail before any connection is attempted, so a
    // dead address is fine here.
    fn dead_file(mode: Mode) -> RemoteFile {
        RemoteFile {
            connector: Connector::new("127.0.0.1:1"),
            dir: "/docs/".to_string(),
            mode,
            view: FileView {
                name: "a.txt".to_string(),
                path: "/docs/a.txt/".to_string(),
                contents: Vec::new(),
            },
        }
    }

    #[test]
    fn read_handle_rejects_write_without_connecting() {
        let f = dead_file(Mode::Read);
        assert!(matches!(
            f.write("x", 0),
            Err(Error::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            f.truncate(0),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn write_handle_rejects_read_without_connecting() {
        let f = dead_file(Mode::Write);
        assert!(matches!(
            f.read(0, -1),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn unreachable_server_is_a_transport_failure() {
        let fs = RemoteFs::connect("127.0.0.1:1");
        assert!(matches!(fs.root(), Err(Error::Transport { .. })));
    }
}
