//! VFS operations trait.
//!
//! This is the host-side dispatch surface: path-based, explicit offset/size,
//! no handle state. A mounted filesystem implements it and is routed to by
//! the [`MountTable`](super::MountTable).

use async_trait::async_trait;
use std::path::Path;

use super::types::{DirEntry, FileAttr, OpenFlags, StatFs};
use super::VfsResult;

/// Core VFS operations trait.
///
/// Paths are always relative to the filesystem's root. The MountTable handles
/// routing and path translation.
#[async_trait]
pub trait VfsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes.
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Read directory entries, sorted by name.
    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Open a file or directory.
    ///
    /// Returns the attributes of the opened node.
    async fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<FileAttr>;

    /// Read file contents.
    ///
    /// Reads up to `size` bytes starting at `offset`. An empty buffer means
    /// end of file.
    async fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write data to a file.
    ///
    /// Returns the number of bytes written.
    async fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32>;

    // ========================================================================
    // Metadata and lifecycle
    // ========================================================================

    /// Returns true if this filesystem is read-only.
    fn read_only(&self) -> bool;

    /// Get filesystem statistics.
    async fn statfs(&self) -> VfsResult<StatFs>;

    /// Called by the mount table after the filesystem has been detached.
    fn release(&self) {}

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.getattr(path).await.is_ok()
    }

    /// Read entire file contents.
    ///
    /// Asks for at least a page so filesystems whose reported size lags the
    /// real content still hand back everything.
    async fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let attr = self.getattr(path).await?;
        let size = attr.size.clamp(4096, u32::MAX as u64) as u32;
        self.read(path, 0, size).await
    }
}
