//! # s2fs-kernel
//!
//! A minimal, read-mostly, in-memory filesystem and the VFS host it mounts
//! into.
//!
//! - [`vfs`] is the host: the [`VfsOps`] dispatch trait, the path-routing
//!   [`MountTable`] and the [`FsRegistry`] of mountable types.
//! - [`s2fs`] is the filesystem: nodes, directory entries, the superblock
//!   lifecycle and the fixed `foo/bar` tree.
//!
//! ```no_run
//! # async fn demo() -> s2fs_kernel::VfsResult<()> {
//! use std::path::Path;
//! use s2fs_kernel::{FsRegistry, MountFlags, MountTable, VfsOps};
//!
//! s2fs_kernel::s2fs::init()?;
//! let table = MountTable::new();
//! table
//!     .mount_type("/mnt/s2fs", FsRegistry::global(), "s2fs", MountFlags::empty(), None)
//!     .await?;
//! let bytes = table.read(Path::new("/mnt/s2fs/foo/bar"), 0, 4096).await?;
//! assert_eq!(bytes, b"Hello World!\n");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod s2fs;
pub mod vfs;

pub use config::{ConfigError, S2fsConfig};
pub use s2fs::{
    Dentry, FileOperations, Layout, LayoutEntry, Node, NodeAllocator, NodeOps, ReadOutcome, S2fs,
    S2fsMount, StaticContent, SuperBlock, SuperState, TreeBuilder,
};
pub use vfs::{
    DirEntry, FileAttr, FileSystemType, FileType, FsRegistry, MountFlags, MountInfo, MountTable,
    OpenFlags, StatFs, VfsError, VfsOps, VfsResult,
};
