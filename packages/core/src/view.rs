//! Snapshot value types returned by tree operations.
//!
//! Views are plain serde values. The server encodes them as response
//! payloads and client-side proxies rehydrate them; they reflect the
//! tree at the moment of the call and are not kept live.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Folder,
    File,
}

/// One child entry of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// A folder at a point in time: its name, derived path, and children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderView {
    pub name: String,
    pub path: String,
    pub entries: Vec<FolderEntry>,
}

impl FolderView {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }
}

/// A file at a point in time, contents included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileView {
    pub name: String,
    pub path: String,
    pub contents: Vec<u8>,
}
