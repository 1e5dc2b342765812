//! Nodes and node allocation.
//!
//! A [`Node`] is the inode-like record behind every directory entry. Its
//! capabilities are fixed at allocation time through [`NodeOps`]: a
//! directory carries none of its own, a file carries the operations that
//! produce its content.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::SystemTime;

use super::content::FileOperations;
use crate::vfs::{FileAttr, FileType, PERM_MASK, VfsError, VfsResult};

/// Operation set of a node, resolved once when the node is allocated.
#[derive(Clone)]
pub enum NodeOps {
    /// Directory: children are served from the dentry tree.
    Directory,
    /// Regular file bound to a content provider.
    File(Arc<dyn FileOperations>),
}

impl NodeOps {
    /// The kind of node these operations belong to.
    pub fn kind(&self) -> FileType {
        match self {
            NodeOps::Directory => FileType::Directory,
            NodeOps::File(_) => FileType::File,
        }
    }
}

impl fmt::Debug for NodeOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOps::Directory => f.write_str("Directory"),
            NodeOps::File(_) => f.write_str("File(<ops>)"),
        }
    }
}

/// An allocated directory or file.
#[derive(Debug)]
pub struct Node {
    ino: u64,
    mode: u32,
    atime: SystemTime,
    mtime: SystemTime,
    ctime: SystemTime,
    size: AtomicU64,
    nlink: AtomicU32,
    ops: NodeOps,
}

impl Node {
    /// Node number.
    pub fn ino(&self) -> u64 {
        self.ino
    }

    /// Directory or file.
    pub fn kind(&self) -> FileType {
        self.ops.kind()
    }

    /// Full mode word, type bits included.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Permission bits only.
    pub fn perm(&self) -> u32 {
        self.mode & PERM_MASK
    }

    /// Size in bytes as last stamped.
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    /// Stamp the size. Concurrent stampers store the same value.
    pub fn set_size(&self, size: u64) {
        self.size.store(size, Ordering::Release);
    }

    /// Link count.
    pub fn nlink(&self) -> u32 {
        self.nlink.load(Ordering::Relaxed)
    }

    pub(crate) fn set_nlink(&self, nlink: u32) {
        self.nlink.store(nlink, Ordering::Relaxed);
    }

    /// Operation set fixed at allocation.
    pub fn ops(&self) -> &NodeOps {
        &self.ops
    }

    /// File operations, if this is a file.
    pub fn file_ops(&self) -> Option<&Arc<dyn FileOperations>> {
        match &self.ops {
            NodeOps::File(ops) => Some(ops),
            NodeOps::Directory => None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind().is_dir()
    }

    /// Snapshot the node as host attributes.
    pub fn attr(&self) -> FileAttr {
        FileAttr {
            ino: self.ino,
            size: self.size(),
            kind: self.kind(),
            perm: self.perm(),
            mtime: self.mtime,
            atime: self.atime,
            ctime: self.ctime,
            nlink: self.nlink(),
        }
    }
}

/// Issues node numbers and builds [`Node`] records.
///
/// Numbers start at 1 and increase monotonically. An allocator created with
/// [`NodeAllocator::with_limit`] refuses to go past its ceiling, which is how
/// id exhaustion surfaces.
#[derive(Debug)]
pub struct NodeAllocator {
    next: AtomicU64,
    limit: u64,
}

impl Default for NodeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeAllocator {
    /// Allocator with the full id space.
    pub fn new() -> Self {
        Self::with_limit(u64::MAX)
    }

    /// Allocator that hands out at most ids `1..=limit`.
    pub fn with_limit(limit: u64) -> Self {
        Self {
            next: AtomicU64::new(1),
            limit,
        }
    }

    /// Number of nodes allocated so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }

    /// Allocate a node with `perm` permission bits and the given operations.
    ///
    /// The kind is taken from `ops`, so the mode's type bits always agree
    /// with the capabilities. All timestamps are set to now and the size
    /// starts at 0.
    pub fn allocate(&self, perm: u32, ops: NodeOps) -> VfsResult<Arc<Node>> {
        let ino = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if n > self.limit { None } else { n.checked_add(1) }
            })
            .map_err(|_| VfsError::allocation_failure("node id space exhausted"))?;

        let now = SystemTime::now();
        let mode = ops.kind().mode_bits() | (perm & PERM_MASK);
        tracing::trace!(ino, mode = %format!("{mode:o}"), "allocated node");

        Ok(Arc::new(Node {
            ino,
            mode,
            atime: now,
            mtime: now,
            ctime: now,
            size: AtomicU64::new(0),
            nlink: AtomicU32::new(1),
            ops,
        }))
    }
}
