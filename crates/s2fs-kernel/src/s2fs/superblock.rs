//! The per-mount superblock.
//!
//! A superblock moves between two states:
//!
//! ```text
//! Unmounted --fill--> Mounted --kill--> Unmounted
//! ```
//!
//! `fill` builds the whole tree before publishing anything, so a failed fill
//! leaves the superblock exactly as it was. Every fill starts from a fresh
//! [`NodeAllocator`], so node numbers restart at 1 and `stat` counts only the
//! live tree.

use parking_lot::Mutex;
use std::sync::Arc;

use super::content::FileOperations;
use super::dentry::Dentry;
use super::node::{NodeAllocator, NodeOps};
use super::tree::{Layout, TreeBuilder};
use super::{BLOCK_SIZE, DIR_PERM, S2FS_MAGIC};
use crate::vfs::{MountFlags, StatFs, VfsError, VfsResult};

/// Lifecycle state of a superblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperState {
    Unmounted,
    Mounted,
}

/// The tree of a mounted superblock and the allocator that numbered it.
struct Live {
    root: Arc<Dentry>,
    allocator: NodeAllocator,
}

/// Filesystem-wide metadata and the root of the tree.
pub struct SuperBlock {
    magic: u32,
    block_size: u32,
    flags: MountFlags,
    node_limit: u64,
    layout: Arc<Layout>,
    content: Arc<dyn FileOperations>,
    live: Mutex<Option<Live>>,
}

impl std::fmt::Debug for SuperBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperBlock")
            .field("magic", &format_args!("{:#x}", self.magic))
            .field("block_size", &self.block_size)
            .field("flags", &self.flags)
            .field("node_limit", &self.node_limit)
            .field("state", &self.state())
            .finish()
    }
}

impl SuperBlock {
    /// An unmounted superblock that will build `layout` when filled.
    ///
    /// Each fill may allocate node ids `1..=node_limit`.
    pub fn new(
        flags: MountFlags,
        node_limit: u64,
        layout: Arc<Layout>,
        content: Arc<dyn FileOperations>,
    ) -> Self {
        Self {
            magic: S2FS_MAGIC,
            block_size: BLOCK_SIZE,
            flags,
            node_limit,
            layout,
            content,
            live: Mutex::new(None),
        }
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn flags(&self) -> MountFlags {
        self.flags
    }

    pub fn state(&self) -> SuperState {
        if self.live.lock().is_some() {
            SuperState::Mounted
        } else {
            SuperState::Unmounted
        }
    }

    /// Root entry, while mounted.
    pub fn root(&self) -> VfsResult<Arc<Dentry>> {
        self.live
            .lock()
            .as_ref()
            .map(|live| Arc::clone(&live.root))
            .ok_or(VfsError::NotMounted)
    }

    /// Build the tree and transition to Mounted.
    ///
    /// Failing to create the root reports [`VfsError::OutOfMemory`]; failures
    /// further down propagate as-is. Either way the partial tree is dropped
    /// and the superblock stays Unmounted.
    pub fn fill(&self, data: Option<&str>) -> VfsResult<Arc<Dentry>> {
        let mut slot = self.live.lock();
        if slot.is_some() {
            return Err(VfsError::AlreadyMounted);
        }
        if let Some(data) = data {
            tracing::debug!(data, "ignoring mount data");
        }

        let allocator = NodeAllocator::with_limit(self.node_limit);
        let root_node = allocator
            .allocate(DIR_PERM, NodeOps::Directory)
            .map_err(|_| VfsError::OutOfMemory)?;
        root_node.set_nlink(2);
        let root = Dentry::new_root(root_node);

        TreeBuilder::new(&allocator, Arc::clone(&self.content)).build(&root, &self.layout)?;

        tracing::info!(
            magic = %format!("{:#x}", self.magic),
            nodes = allocator.allocated(),
            "superblock filled"
        );
        *slot = Some(Live {
            root: Arc::clone(&root),
            allocator,
        });
        Ok(root)
    }

    /// Release the tree and transition to Unmounted. No-op when unmounted.
    ///
    /// Readers still holding entries keep them alive until they let go.
    pub fn kill(&self) {
        if self.live.lock().take().is_some() {
            tracing::info!(magic = %format!("{:#x}", self.magic), "superblock killed");
        }
    }

    /// Block size and magic, plus the node count of the live tree.
    pub fn stat(&self) -> VfsResult<StatFs> {
        let guard = self.live.lock();
        let live = guard.as_ref().ok_or(VfsError::NotMounted)?;
        Ok(StatFs::in_memory(
            self.magic,
            self.block_size,
            live.allocator.allocated(),
        ))
    }
}
