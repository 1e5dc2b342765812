//! Mount-time tree construction.
//!
//! The shape of the tree is described by a [`Layout`]. [`TreeBuilder`] walks
//! it depth-first exactly once, while the superblock is being filled.

use std::sync::Arc;

use super::content::FileOperations;
use super::dentry::Dentry;
use super::node::{NodeAllocator, NodeOps};
use super::{DIR_PERM, FILE_PERM};
use crate::vfs::VfsResult;

/// One entry of a [`Layout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEntry {
    Directory {
        name: String,
        children: Vec<LayoutEntry>,
    },
    File {
        name: String,
    },
}

impl LayoutEntry {
    pub fn dir(name: impl Into<String>, children: Vec<LayoutEntry>) -> Self {
        Self::Directory {
            name: name.into(),
            children,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::File { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. } | Self::File { name } => name,
        }
    }
}

/// Static description of the entries under the root directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    entries: Vec<LayoutEntry>,
}

impl Layout {
    pub fn new(entries: Vec<LayoutEntry>) -> Self {
        Self { entries }
    }

    /// `foo/` containing the file `bar`.
    pub fn demo() -> Self {
        Self::new(vec![LayoutEntry::dir("foo", vec![LayoutEntry::file("bar")])])
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    /// Number of nodes the layout needs, root excluded.
    pub fn node_count(&self) -> u64 {
        fn count(entries: &[LayoutEntry]) -> u64 {
            entries
                .iter()
                .map(|e| match e {
                    LayoutEntry::Directory { children, .. } => 1 + count(children),
                    LayoutEntry::File { .. } => 1,
                })
                .sum()
        }
        count(&self.entries)
    }
}

/// Allocates nodes and links them into the tree.
pub struct TreeBuilder<'a> {
    allocator: &'a NodeAllocator,
    content: Arc<dyn FileOperations>,
}

impl<'a> TreeBuilder<'a> {
    /// Builder whose files are all bound to `content`.
    pub fn new(allocator: &'a NodeAllocator, content: Arc<dyn FileOperations>) -> Self {
        Self { allocator, content }
    }

    /// Create a `0755` directory named `name` under `parent`.
    pub fn make_directory(&self, parent: &Arc<Dentry>, name: &str) -> VfsResult<Arc<Dentry>> {
        Dentry::check_vacant(parent, name)?;
        let node = self.allocator.allocate(DIR_PERM, NodeOps::Directory)?;
        let entry = Dentry::attach(parent, name, node)?;
        tracing::debug!(path = %entry.path(), ino = entry.node().ino(), "created directory");
        Ok(entry)
    }

    /// Create a `0644` file named `name` under `parent`.
    pub fn make_file(&self, parent: &Arc<Dentry>, name: &str) -> VfsResult<Arc<Dentry>> {
        Dentry::check_vacant(parent, name)?;
        let ops = NodeOps::File(Arc::clone(&self.content));
        let node = self.allocator.allocate(FILE_PERM, ops)?;
        let entry = Dentry::attach(parent, name, node)?;
        tracing::debug!(path = %entry.path(), ino = entry.node().ino(), "created file");
        Ok(entry)
    }

    /// Populate `root` from `layout`, depth-first.
    ///
    /// Stops at the first failure. Entries created before it stay linked
    /// under `root`; the caller decides whether to publish or drop the tree.
    pub fn build(&self, root: &Arc<Dentry>, layout: &Layout) -> VfsResult<()> {
        self.build_entries(root, layout.entries())
    }

    fn build_entries(&self, parent: &Arc<Dentry>, entries: &[LayoutEntry]) -> VfsResult<()> {
        for entry in entries {
            match entry {
                LayoutEntry::Directory { name, children } => {
                    let dir = self.make_directory(parent, name)?;
                    self.build_entries(&dir, children)?;
                }
                LayoutEntry::File { name } => {
                    self.make_file(parent, name)?;
                }
            }
        }
        Ok(())
    }
}
