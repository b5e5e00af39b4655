//! The filesystem-level contract shared by local and remote trees.

use crate::error::Error;
use crate::memory::MemoryMap;
use crate::view::FolderView;

/// Operations every tree exposes, local or proxied.
///
/// A remote implementation forwards each call over the wire to the
/// authoritative server; callers cannot tell the difference beyond
/// latency and `Transport` errors.
pub trait TreeOps {
    /// Resolve `path` to a folder, make it current, and return its view.
    fn change_directory(&self, path: &str) -> Result<FolderView, Error>;

    /// Create an empty folder at `path`.
    fn create_directory(&self, path: &str) -> Result<(), Error>;

    /// Re-parent the node at `src` under the folder at `dest`.
    fn move_node(&self, src: &str, dest: &str) -> Result<(), Error>;

    /// Delete the file or empty folder at `path`.
    fn delete(&self, path: &str) -> Result<(), Error>;

    /// Persist the whole-tree snapshot.
    fn save(&self) -> Result<(), Error>;

    /// The serialized snapshot, for the debug dump.
    fn memory_map(&self) -> Result<MemoryMap, Error>;

    fn root(&self) -> Result<FolderView, Error>;

    fn current(&self) -> Result<FolderView, Error>;
}
