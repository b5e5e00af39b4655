//! Tree entities: nodes, folders, files.
//!
//! Nodes are stored in an arena and refer to each other by [`NodeId`].
//! The parent link is a plain id, never a reference, so the tree can be
//! mutated and serialized without ownership cycles.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

/// Shared, lockable file contents.
///
/// The mutex is the per-File lock: one lock per file instance, taken for
/// the duration of each buffer operation.
pub type FileBuf = Arc<Mutex<Vec<u8>>>;

/// Lock a file buffer, recovering from a poisoned mutex.
///
/// A panic while holding the lock leaves the buffer in whatever state the
/// last completed operation produced, which is still a valid buffer.
pub fn lock_buf(buf: &FileBuf) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(|e| e.into_inner())
}

/// A tree entity: a name, a parent back-reference, and folder or file data.
#[derive(Debug, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// `None` only for the root.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum NodeKind {
    Folder {
        /// Child name to node id. Names are unique within a folder.
        children: BTreeMap<String, NodeId>,
    },
    File {
        #[serde(with = "buf_serde")]
        contents: FileBuf,
    },
}

impl Node {
    pub fn folder(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Node {
            name: name.into(),
            parent,
            kind: NodeKind::Folder {
                children: BTreeMap::new(),
            },
        }
    }

    pub fn file(name: impl Into<String>, parent: NodeId) -> Self {
        Node {
            name: name.into(),
            parent: Some(parent),
            kind: NodeKind::File {
                contents: Arc::new(Mutex::new(Vec::new())),
            },
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }
}

/// Serde adapter for `Arc<Mutex<Vec<u8>>>` file contents.
mod buf_serde {
    use super::FileBuf;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::sync::{Arc, Mutex};

    pub fn serialize<S: Serializer>(buf: &FileBuf, serializer: S) -> Result<S::Ok, S::Error> {
        super::lock_buf(buf).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FileBuf, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        Ok(Arc::new(Mutex::new(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_node_starts_empty() {
        let n = Node::folder("root", None);
        assert!(n.is_folder());
        assert!(!n.is_file());
        match &n.kind {
            NodeKind::Folder { children } => assert!(children.is_empty()),
            _ => panic!("expected folder"),
        }
    }

    #[test]
    fn file_node_has_empty_buffer() {
        let n = Node::file("a.txt", NodeId(0));
        assert!(n.is_file());
        match &n.kind {
            NodeKind::File { contents } => assert!(lock_buf(contents).is_empty()),
            _ => panic!("expected file"),
        }
    }

    #[test]
    fn node_serde_roundtrip() {
        let n = Node::file("a.txt", NodeId(3));
        match &n.kind {
            NodeKind::File { contents } => lock_buf(contents).extend_from_slice(b"hello"),
            _ => unreachable!(),
        }

        let json = serde_json::to_string(&n).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "a.txt");
        assert_eq!(back.parent, Some(NodeId(3)));
        match &back.kind {
            NodeKind::File { contents } => assert_eq!(&*lock_buf(contents), b"hello"),
            _ => panic!("expected file"),
        }
    }
}
