//! TreeFS core: the in-memory hierarchical file tree.
//!
//! This crate holds everything that manipulates the tree itself:
//! - `Node`/`Folder`/`File` entities in an id-indexed arena
//! - path resolution and structural mutation on [`FileSystem`]
//! - capability-gated [`FileHandle`]s and the open-handle table
//! - whole-tree snapshot persistence and the memory-map debug dump
//!
//! The [`TreeOps`] trait is the seam between local and remote trees: the
//! `treefs-remote` crate implements it with client-side proxies that
//! forward every call to an authoritative server.
//!
//! # Example
//!
//! ```rust
//! use treefs_core::{FileSystem, TreeOps};
//!
//! let fs = FileSystem::new();
//! fs.create_directory("/docs").unwrap();
//! let docs = fs.change_directory("/docs").unwrap();
//! assert_eq!(docs.path, "/docs/");
//!
//! let handle = fs.open_file("a.txt", "w").unwrap();
//! handle.write(b"hello", 0).unwrap();
//! ```

pub mod buffer;
mod error;
mod fs;
mod handle;
mod memory;
mod node;
mod traits;
mod view;

pub use error::Error;
pub use fs::FileSystem;
pub use handle::{FileHandle, HandleTable, Mode};
pub use memory::MemoryMap;
pub use node::{FileBuf, Node, NodeId, NodeKind};
pub use traits::TreeOps;
pub use view::{EntryKind, FileView, FolderEntry, FolderView};
