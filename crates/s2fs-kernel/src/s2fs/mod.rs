//! s2fs: a tiny in-memory filesystem with a fixed tree.
//!
//! ```text
//! /           0755
//! └── foo/    0755
//!     └── bar 0644   "Hello World!\n"
//! ```
//!
//! Pieces, leaves first:
//!
//! - [`NodeAllocator`] - node numbers and inode-like [`Node`] records
//! - [`TreeBuilder`] - links nodes into [`Dentry`] entries from a [`Layout`]
//! - [`StaticContent`] - the [`FileOperations`] behind `bar`
//! - [`SuperBlock`] - owns the tree; `fill` / `kill` / `stat`
//! - [`S2fs`] - the filesystem type: registration and mounting
//!
//! `bar` reports size 0 until it has been read once, and writes to it are
//! accepted and discarded.

mod content;
mod dentry;
mod fs_type;
mod node;
mod superblock;
mod tree;

pub use content::{FileOperations, HELLO, ReadOutcome, StaticContent};
pub use dentry::Dentry;
pub use fs_type::{S2fs, S2fsMount, exit, init};
pub use node::{Node, NodeAllocator, NodeOps};
pub use superblock::{SuperBlock, SuperState};
pub use tree::{Layout, LayoutEntry, TreeBuilder};

/// Name used in mount requests.
pub const FS_NAME: &str = "s2fs";

/// Superblock magic number.
pub const S2FS_MAGIC: u32 = 0x1992_0342;

/// Reported block size.
pub const BLOCK_SIZE: u32 = 4096;

/// Permissions of every directory, root included.
pub const DIR_PERM: u32 = 0o755;

/// Permissions of every file.
pub const FILE_PERM: u32 = 0o644;
