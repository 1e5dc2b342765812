//! Virtual Filesystem host layer.
//!
//! This module is the "host" a filesystem is mounted into. Key components:
//!
//! - [`VfsOps`] - Core trait for filesystem operations
//! - [`MountTable`] - Routes operations to mounted filesystems based on path
//! - [`FsRegistry`] - Named filesystem types that can be mounted
//!
//! ## Design Decisions
//!
//! - **Path-based dispatch**: Operations use paths relative to the mount.
//!   Filesystems map paths onto their own node model.
//! - **Explicit offset/size**: Read/write take offset and size, no handle
//!   state is kept between calls.
//! - **Longest-prefix routing**: MountTable routes to the most specific
//!   mount point that matches.

mod error;
mod mount;
mod ops;
mod registry;
mod types;

pub use error::{VfsError, VfsResult};
pub use mount::{MountInfo, MountTable};
pub use ops::VfsOps;
pub use registry::{FileSystemType, FsRegistry, MountFlags};
pub use types::{
    DirEntry, FileAttr, FileType, OpenFlags, StatFs, PERM_MASK, S_IFDIR, S_IFMT, S_IFREG,
};
