//! Directory entries.
//!
//! A [`Dentry`] names one [`Node`] inside its parent directory. Entries own
//! their children and point back at their parent weakly, so dropping the
//! root releases the whole tree.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::{Arc, Weak};

use super::node::Node;
use crate::vfs::{VfsError, VfsResult};

/// A named link from a directory to a node.
#[derive(Debug)]
pub struct Dentry {
    name: String,
    node: Arc<Node>,
    parent: Weak<Dentry>,
    children: RwLock<BTreeMap<String, Arc<Dentry>>>,
}

impl Dentry {
    /// Make the root entry of a tree.
    pub(crate) fn new_root(node: Arc<Node>) -> Arc<Self> {
        Arc::new(Self {
            name: "/".to_string(),
            node,
            parent: Weak::new(),
            children: RwLock::new(BTreeMap::new()),
        })
    }

    /// Check that `name` is valid and free under `parent`.
    pub(crate) fn check_vacant(parent: &Dentry, name: &str) -> VfsResult<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(VfsError::invalid_path(name));
        }
        if !parent.node.is_dir() {
            return Err(VfsError::not_a_directory(parent.path()));
        }
        if parent.children.read().contains_key(name) {
            return Err(VfsError::name_collision(parent.child_path(name)));
        }
        Ok(())
    }

    /// Link `node` under `parent` as `name`.
    pub(crate) fn attach(parent: &Arc<Dentry>, name: &str, node: Arc<Node>) -> VfsResult<Arc<Self>> {
        Self::check_vacant(parent, name)?;

        let mut children = parent.children.write();
        if children.contains_key(name) {
            return Err(VfsError::name_collision(parent.child_path(name)));
        }
        let entry = Arc::new(Self {
            name: name.to_string(),
            node,
            parent: Arc::downgrade(parent),
            children: RwLock::new(BTreeMap::new()),
        });
        children.insert(name.to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Parent entry; `None` for the root.
    pub fn parent(&self) -> Option<Arc<Dentry>> {
        self.parent.upgrade()
    }

    pub fn is_root(&self) -> bool {
        self.parent.strong_count() == 0 && self.name == "/"
    }

    /// Child by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<Dentry>> {
        self.children.read().get(name).cloned()
    }

    /// Children sorted by name.
    pub fn children(&self) -> Vec<Arc<Dentry>> {
        self.children.read().values().cloned().collect()
    }

    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    /// Absolute path of this entry within its tree.
    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => parent.child_path(&self.name),
            None => "/".to_string(),
        }
    }

    fn child_path(&self, name: &str) -> String {
        let base = self.path();
        if base == "/" {
            format!("/{name}")
        } else {
            format!("{base}/{name}")
        }
    }

    /// Walk `path` from this entry.
    ///
    /// `.` is skipped and `..` climbs to the parent, stopping at the root.
    /// Leading `/` is ignored, so absolute and relative forms resolve the
    /// same way.
    pub fn resolve(self: &Arc<Self>, path: &Path) -> VfsResult<Arc<Dentry>> {
        let mut current = Arc::clone(self);
        for component in path.components() {
            match component {
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    if let Some(parent) = current.parent() {
                        current = parent;
                    }
                }
                Component::Normal(name) => {
                    if !current.node.is_dir() {
                        return Err(VfsError::not_a_directory(current.path()));
                    }
                    let name = name.to_string_lossy();
                    current = current
                        .lookup(&name)
                        .ok_or_else(|| VfsError::not_found(path.display().to_string()))?;
                }
            }
        }
        Ok(current)
    }
}
