//! Core VFS types.
//!
//! These are the records the host layer hands back to callers. They are
//! path-based views of whatever node model a filesystem keeps internally,
//! and serialize cleanly for the CLI's `--json` output.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File type bits of a mode word.
pub const S_IFMT: u32 = 0o170000;
/// Directory type bits.
pub const S_IFDIR: u32 = 0o040000;
/// Regular file type bits.
pub const S_IFREG: u32 = 0o100000;
/// Permission bits of a mode word.
pub const PERM_MASK: u32 = 0o7777;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// File type bits for a mode word.
    pub fn mode_bits(&self) -> u32 {
        match self {
            FileType::File => S_IFREG,
            FileType::Directory => S_IFDIR,
        }
    }

    /// Decode the type bits of a full mode word.
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & S_IFMT {
            S_IFREG => Some(FileType::File),
            S_IFDIR => Some(FileType::Directory),
            _ => None,
        }
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttr {
    /// Node number, unique within one mounted filesystem.
    pub ino: u64,
    /// Size in bytes.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions (e.g., 0o644).
    pub perm: u32,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last access time.
    pub atime: SystemTime,
    /// Change time.
    pub ctime: SystemTime,
    /// Number of hard links.
    pub nlink: u32,
}

impl FileAttr {
    /// Create attributes for a new file.
    pub fn file(ino: u64, size: u64, perm: u32) -> Self {
        let now = SystemTime::now();
        Self {
            ino,
            size,
            kind: FileType::File,
            perm,
            mtime: now,
            atime: now,
            ctime: now,
            nlink: 1,
        }
    }

    /// Create attributes for a new directory.
    pub fn directory(ino: u64, perm: u32) -> Self {
        let now = SystemTime::now();
        Self {
            ino,
            size: 0,
            kind: FileType::Directory,
            perm,
            mtime: now,
            atime: now,
            ctime: now,
            nlink: 2, // . and ..
        }
    }

    /// Full mode word (type bits and permissions).
    pub fn mode(&self) -> u32 {
        self.kind.mode_bits() | (self.perm & PERM_MASK)
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
    /// Node number the entry links to.
    pub ino: u64,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileType, ino: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            ino,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>, ino: u64) -> Self {
        Self::new(name, FileType::File, ino)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>, ino: u64) -> Self {
        Self::new(name, FileType::Directory, ino)
    }
}

/// Filesystem statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatFs {
    /// Filesystem magic number.
    pub fs_type: u32,
    /// Total blocks.
    pub blocks: u64,
    /// Free blocks.
    pub bfree: u64,
    /// Available blocks (to non-root).
    pub bavail: u64,
    /// Total inodes.
    pub files: u64,
    /// Free inodes.
    pub ffree: u64,
    /// Block size.
    pub bsize: u32,
    /// Maximum name length.
    pub namelen: u32,
    /// Fragment size.
    pub frsize: u32,
}

impl StatFs {
    /// Statistics for a memory-resident filesystem: no blocks, nothing free.
    pub fn in_memory(fs_type: u32, bsize: u32, files: u64) -> Self {
        Self {
            fs_type,
            blocks: 0,
            bfree: 0,
            bavail: 0,
            files,
            ffree: 0,
            bsize,
            namelen: 255,
            frsize: bsize,
        }
    }
}

/// Open file flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
    /// Append mode.
    pub append: bool,
    /// Truncate on open.
    pub truncate: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            truncate: false,
        }
    }
}

impl OpenFlags {
    /// Read-only access.
    pub fn read() -> Self {
        Self::default()
    }

    /// Write access (also enables read).
    pub fn write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    /// Returns true if the open asks to modify the file.
    pub fn wants_write(&self) -> bool {
        self.write || self.append || self.truncate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert!(FileType::File.is_file());
        assert!(!FileType::File.is_dir());
        assert!(FileType::Directory.is_dir());
    }

    #[test]
    fn test_mode_bits_round_trip_through_attr() {
        let file = FileAttr::file(7, 0, 0o644);
        assert_eq!(file.mode(), S_IFREG | 0o644);
        assert_eq!(FileType::from_mode(file.mode()), Some(FileType::File));

        let dir = FileAttr::directory(1, 0o755);
        assert_eq!(dir.mode(), S_IFDIR | 0o755);
        assert_eq!(dir.nlink, 2);
        assert_eq!(FileType::from_mode(0o644), None);
    }

    #[test]
    fn test_dir_entry() {
        let file = DirEntry::file("bar", 3);
        assert_eq!(file.name, "bar");
        assert_eq!(file.ino, 3);
        assert!(file.kind.is_file());

        let dir = DirEntry::directory("foo", 2);
        assert!(dir.kind.is_dir());
    }

    #[test]
    fn test_statfs_in_memory() {
        let st = StatFs::in_memory(0x1992_0342, 4096, 3);
        assert_eq!(st.bsize, 4096);
        assert_eq!(st.frsize, 4096);
        assert_eq!(st.files, 3);
        assert_eq!(st.bfree, 0);
    }

    #[test]
    fn test_open_flags() {
        let read = OpenFlags::read();
        assert!(read.read);
        assert!(!read.wants_write());

        let write = OpenFlags::write();
        assert!(write.write);
        assert!(write.wants_write());
    }
}
