//! The authoritative filesystem: arena-backed tree, path resolution, and
//! structural mutation.
//!
//! ## Paths
//!
//! Paths are `/`-separated; empty segments are discarded. A leading `/`
//! anchors resolution at the root, otherwise it starts at the current
//! working folder. `..` ascends one level and fails at the root.
//!
//! ## Locking
//!
//! One mutex guards the tree structure (`root`, `current`, child maps);
//! each file buffer carries its own mutex. Content operations resolve
//! under the tree lock, release it, then lock only the file they touch.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::buffer;
use crate::error::Error;
use crate::handle::{FileHandle, HandleTable, Mode};
use crate::memory::MemoryMap;
use crate::node::{lock_buf, FileBuf, Node, NodeId, NodeKind};
use crate::traits::TreeOps;
use crate::view::{EntryKind, FileView, FolderEntry, FolderView};

/// The tree proper: an arena of nodes plus the root and current ids.
#[derive(Debug, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
    current: NodeId,
}

impl Tree {
    fn new() -> Self {
        Tree {
            nodes: vec![Some(Node::folder("root", None))],
            free: Vec::new(),
            root: NodeId(0),
            current: NodeId(0),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.0] = None;
        self.free.push(id.0);
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0].as_ref().expect("dangling node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0].as_mut().expect("dangling node id")
    }

    fn children(&self, id: NodeId) -> &BTreeMap<String, NodeId> {
        match &self.node(id).kind {
            NodeKind::Folder { children } => children,
            NodeKind::File { .. } => panic!("children() called on a file"),
        }
    }

    fn children_mut(&mut self, id: NodeId) -> &mut BTreeMap<String, NodeId> {
        match &mut self.node_mut(id).kind {
            NodeKind::Folder { children } => children,
            NodeKind::File { .. } => panic!("children_mut() called on a file"),
        }
    }

    /// Derive a node's path from its parent chain. The root renders as
    /// `/`; everything else as `/a/b/`.
    fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.node(cur).parent {
            names.push(self.node(cur).name.clone());
            cur = parent;
        }
        if names.is_empty() {
            return "/".to_string();
        }
        names.reverse();
        format!("/{}/", names.join("/"))
    }

    /// Resolve a path to a folder id.
    ///
    /// The empty path resolves to the current folder. A segment naming a
    /// file fails with `IsAFile`; an unknown segment with `NotFound`;
    /// `..` at the root with `NotFound`.
    fn resolve_folder(&self, path: &str) -> Result<NodeId, Error> {
        if path.is_empty() {
            return Ok(self.current);
        }

        let (mut cur, rest) = match path.strip_prefix('/') {
            Some(rest) => (self.root, rest),
            None => (self.current, path),
        };
        log::debug!("resolve_folder: path = {}, start = {}", path, self.path_of(cur));

        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            if segment == ".." {
                cur = self
                    .node(cur)
                    .parent
                    .ok_or_else(|| Error::not_found(path))?;
                continue;
            }
            match self.children(cur).get(segment) {
                Some(&id) if self.node(id).is_folder() => cur = id,
                Some(_) => {
                    return Err(Error::IsAFile {
                        path: path.to_string(),
                    })
                }
                None => return Err(Error::not_found(path)),
            }
        }
        Ok(cur)
    }

    /// Split a path into its parent folder and leaf name.
    ///
    /// Everything before the final `/` resolves as a folder path; a bare
    /// name resolves its parent to the starting context (root for
    /// absolute paths, current otherwise).
    fn resolve_parent(&self, path: &str) -> Result<(NodeId, String), Error> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::invalid_arguments(format!(
                "'{}' has no leaf name",
                path
            )));
        }

        match trimmed.rsplit_once('/') {
            None => Ok((self.current, trimmed.to_string())),
            Some((before, leaf)) => {
                let parent = if path.starts_with('/') {
                    // Keep the absolute anchor even when `before` is
                    // just the leading slash.
                    self.resolve_folder(&format!("/{}", before.trim_start_matches('/')))?
                } else {
                    self.resolve_folder(before)?
                };
                Ok((parent, leaf.to_string()))
            }
        }
    }

    fn resolve_node(&self, path: &str) -> Result<NodeId, Error> {
        let (parent, leaf) = self.resolve_parent(path)?;
        self.children(parent)
            .get(&leaf)
            .copied()
            .ok_or_else(|| Error::not_found(path))
    }

    fn folder_view(&self, id: NodeId) -> FolderView {
        let entries = self
            .children(id)
            .iter()
            .map(|(name, &child)| FolderEntry {
                name: name.clone(),
                kind: if self.node(child).is_folder() {
                    EntryKind::Folder
                } else {
                    EntryKind::File
                },
            })
            .collect();
        FolderView {
            name: self.node(id).name.clone(),
            path: self.path_of(id),
            entries,
        }
    }

    fn file_view(&self, id: NodeId) -> FileView {
        let contents = match &self.node(id).kind {
            NodeKind::File { contents } => lock_buf(contents).clone(),
            NodeKind::Folder { .. } => Vec::new(),
        };
        FileView {
            name: self.node(id).name.clone(),
            path: self.path_of(id),
            contents,
        }
    }

    /// Look up a file's buffer under `folder`, by name.
    fn file_buf(&self, folder: NodeId, name: &str) -> Result<FileBuf, Error> {
        let id = self
            .children(folder)
            .get(name)
            .copied()
            .ok_or_else(|| Error::not_found(name))?;
        match &self.node(id).kind {
            NodeKind::File { contents } => Ok(contents.clone()),
            NodeKind::Folder { .. } => Err(Error::IsAFolder {
                path: self.path_of(id),
            }),
        }
    }

    /// Open (or create, for writing modes) a file under `folder`.
    fn open_at(&mut self, folder: NodeId, name: &str, mode: Mode) -> Result<NodeId, Error> {
        match self.children(folder).get(name).copied() {
            Some(id) if self.node(id).is_file() => Ok(id),
            Some(id) => Err(Error::IsAFolder {
                path: self.path_of(id),
            }),
            None if mode.can_write() => {
                let id = self.alloc(Node::file(name, folder));
                self.children_mut(folder).insert(name.to_string(), id);
                Ok(id)
            }
            None => Err(Error::not_found(name)),
        }
    }

    fn insert_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, Error> {
        let name = node.name.clone();
        if self.children(parent).contains_key(&name) {
            return Err(Error::invalid_arguments(format!(
                "{}{} already exists",
                self.path_of(parent),
                name
            )));
        }
        let id = self.alloc(node);
        self.children_mut(parent).insert(name, id);
        Ok(id)
    }

    /// True when `node` lies on `id`'s parent chain (or is `id` itself).
    fn is_ancestor_or_self(&self, node: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == node {
                return true;
            }
            cur = self.node(c).parent;
        }
        false
    }
}

/// The filesystem aggregate: the tree, its optional snapshot path, and
/// the per-filesystem open-handle table.
///
/// All methods take `&self`; internal locking makes structural mutation
/// mutually exclusive. Constructed once per server process, or once per
/// session for local use.
#[derive(Debug)]
pub struct FileSystem {
    tree: Mutex<Tree>,
    snapshot: Option<PathBuf>,
    handles: HandleTable,
}

impl FileSystem {
    /// An ephemeral filesystem with a fresh empty root and no snapshot.
    pub fn new() -> Self {
        FileSystem {
            tree: Mutex::new(Tree::new()),
            snapshot: None,
            handles: HandleTable::new(),
        }
    }

    /// Load from a snapshot file, creating an empty tree (and writing it
    /// out) when the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        match std::fs::read(&path) {
            Ok(bytes) => {
                let tree: Tree = serde_json::from_slice(&bytes)?;
                Ok(FileSystem {
                    tree: Mutex::new(tree),
                    snapshot: Some(path),
                    handles: HandleTable::new(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("{}: snapshot not found, starting empty", path.display());
                let fs = FileSystem {
                    tree: Mutex::new(Tree::new()),
                    snapshot: Some(path),
                    handles: HandleTable::new(),
                };
                fs.save()?;
                Ok(fs)
            }
            Err(e) => Err(Error::Snapshot {
                message: format!("{}: {}", path.display(), e),
            }),
        }
    }

    /// Cap the number of simultaneously open handles.
    pub fn with_max_open(mut self, max_open: usize) -> Self {
        self.handles = HandleTable::with_max_open(max_open);
        self
    }

    /// The open-handle table shared by every caller of this filesystem.
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    fn lock_tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persist the snapshot while holding the tree lock. A filesystem
    /// without a snapshot path is ephemeral and this is a no-op.
    fn save_locked(&self, tree: &Tree) -> Result<(), Error> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(tree)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &bytes).map_err(|e| Error::Snapshot {
            message: format!("{}: {}", tmp.display(), e),
        })?;
        std::fs::rename(&tmp, path).map_err(|e| Error::Snapshot {
            message: format!("{}: {}", path.display(), e),
        })?;
        log::debug!("saved snapshot ({} bytes) to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Create an empty file in the current folder.
    pub fn create_file(&self, name: &str) -> Result<(), Error> {
        let mut t = self.lock_tree();
        let current = t.current;
        t.insert_child(current, Node::file(name, current))?;
        self.save_locked(&t)
    }

    /// Open a file in the current folder, creating it first when the
    /// mode implies writing. Returns a capability handle for `mode`.
    pub fn open_file(&self, name: &str, mode: &str) -> Result<FileHandle, Error> {
        let mode: Mode = mode.parse()?;
        let mut t = self.lock_tree();
        let current = t.current;
        let existed = t.children(current).contains_key(name);
        let id = t.open_at(current, name, mode)?;
        let path = t.path_of(id);
        let buf = match &t.node(id).kind {
            NodeKind::File { contents } => contents.clone(),
            NodeKind::Folder { .. } => unreachable!("open_at returned a folder"),
        };
        if !existed {
            self.save_locked(&t)?;
        }
        Ok(FileHandle::new(name, path, mode, buf))
    }

    // Path+name addressed operations, used by the server dispatcher.

    /// Create an empty file under the folder at `path`.
    pub fn create_file_in(&self, path: &str, name: &str) -> Result<(), Error> {
        let mut t = self.lock_tree();
        let folder = t.resolve_folder(path)?;
        t.insert_child(folder, Node::file(name, folder))?;
        self.save_locked(&t)
    }

    /// Open (create if missing, for writing modes) and snapshot a file.
    pub fn open_file_in(&self, path: &str, name: &str, mode: &str) -> Result<FileView, Error> {
        let mode: Mode = mode.parse()?;
        let mut t = self.lock_tree();
        let folder = t.resolve_folder(path)?;
        let existed = t.children(folder).contains_key(name);
        let id = t.open_at(folder, name, mode)?;
        if !existed {
            self.save_locked(&t)?;
        }
        Ok(t.file_view(id))
    }

    /// Delete the named file under the folder at `path`.
    pub fn delete_file_in(&self, path: &str, name: &str) -> Result<(), Error> {
        let mut t = self.lock_tree();
        let folder = t.resolve_folder(path)?;
        match t.children(folder).get(name).copied() {
            Some(id) if t.node(id).is_file() => {
                t.children_mut(folder).remove(name);
                t.release(id);
                self.save_locked(&t)
            }
            Some(id) => Err(Error::IsAFolder {
                path: t.path_of(id),
            }),
            None => Err(Error::not_found(name)),
        }
    }

    pub fn write_contents(
        &self,
        path: &str,
        name: &str,
        contents: &[u8],
        start: usize,
        append: bool,
    ) -> Result<(), Error> {
        let buf = {
            let t = self.lock_tree();
            let folder = t.resolve_folder(path)?;
            t.file_buf(folder, name)?
        };
        buffer::write(&mut lock_buf(&buf), contents, start, append);
        self.save()
    }

    pub fn read_contents(
        &self,
        path: &str,
        name: &str,
        start: usize,
        end: i64,
    ) -> Result<Vec<u8>, Error> {
        let buf = {
            let t = self.lock_tree();
            let folder = t.resolve_folder(path)?;
            t.file_buf(folder, name)?
        };
        let out = buffer::read(&lock_buf(&buf), start, end);
        Ok(out)
    }

    pub fn move_contents(
        &self,
        path: &str,
        name: &str,
        start: usize,
        end: i64,
        target: usize,
    ) -> Result<(), Error> {
        let buf = {
            let t = self.lock_tree();
            let folder = t.resolve_folder(path)?;
            t.file_buf(folder, name)?
        };
        buffer::move_range(&mut lock_buf(&buf), start, end, target);
        self.save()
    }

    pub fn truncate_contents(&self, path: &str, name: &str, end: usize) -> Result<(), Error> {
        let buf = {
            let t = self.lock_tree();
            let folder = t.resolve_folder(path)?;
            t.file_buf(folder, name)?
        };
        buffer::truncate(&mut lock_buf(&buf), end);
        self.save()
    }
}

impl TreeOps for FileSystem {
    fn change_directory(&self, path: &str) -> Result<FolderView, Error> {
        log::debug!("change_directory: path = {}", path);
        let mut t = self.lock_tree();
        let id = t.resolve_folder(path)?;
        t.current = id;
        Ok(t.folder_view(id))
    }

    fn create_directory(&self, path: &str) -> Result<(), Error> {
        log::debug!("create_directory: path = {}", path);
        let mut t = self.lock_tree();
        let (parent, name) = t.resolve_parent(path)?;
        t.insert_child(parent, Node::folder(name, Some(parent)))?;
        self.save_locked(&t)
    }

    fn move_node(&self, src: &str, dest: &str) -> Result<(), Error> {
        log::debug!("move: src = {} => dest = {}", src, dest);
        let mut t = self.lock_tree();
        let node = t.resolve_node(src)?;
        let dest_folder = t.resolve_folder(dest)?;

        if t.is_ancestor_or_self(node, dest_folder) {
            return Err(Error::invalid_arguments(format!(
                "cannot move {} into itself",
                src
            )));
        }
        let name = t.node(node).name.clone();
        if t.children(dest_folder).contains_key(&name) {
            return Err(Error::invalid_arguments(format!(
                "{}{} already exists",
                t.path_of(dest_folder),
                name
            )));
        }

        let old_parent = t.node(node).parent.expect("resolved node has a parent");
        t.children_mut(old_parent).remove(&name);
        t.node_mut(node).parent = Some(dest_folder);
        t.children_mut(dest_folder).insert(name, node);
        self.save_locked(&t)
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        let mut t = self.lock_tree();
        let node = t.resolve_node(path)?;
        let deletable = t.node(node).is_file() || t.children(node).is_empty();
        if !deletable {
            return Err(Error::NotEmpty {
                path: t.path_of(node),
            });
        }
        if t.current == node {
            // The working folder must stay reachable.
            t.current = t.node(node).parent.expect("non-root node has a parent");
        }
        let parent = t.node(node).parent.expect("resolved node has a parent");
        let name = t.node(node).name.clone();
        t.children_mut(parent).remove(&name);
        t.release(node);
        self.save_locked(&t)
    }

    fn save(&self) -> Result<(), Error> {
        let t = self.lock_tree();
        self.save_locked(&t)
    }

    fn memory_map(&self) -> Result<MemoryMap, Error> {
        let t = self.lock_tree();
        Ok(MemoryMap::new(serde_json::to_vec(&*t)?))
    }

    fn root(&self) -> Result<FolderView, Error> {
        let t = self.lock_tree();
        Ok(t.folder_view(t.root))
    }

    fn current(&self) -> Result<FolderView, Error> {
        let t = self.lock_tree();
        Ok(t.folder_view(t.current))
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}
