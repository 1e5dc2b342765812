//! VFS error types.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// File or directory not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Filesystem is read-only.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Invalid path or entry name.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// No mount point for path.
    #[error("no mount point for path: {0}")]
    NoMountPoint(String),

    /// A node or directory entry could not be created.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// The root of a superblock could not be created.
    #[error("out of memory")]
    OutOfMemory,

    /// Sibling entry with the same name already exists.
    #[error("name collision: {0}")]
    NameCollision(String),

    /// Superblock is not mounted.
    #[error("superblock is not mounted")]
    NotMounted,

    /// Superblock is already mounted.
    #[error("superblock is already mounted")]
    AlreadyMounted,

    /// Filesystem type is already registered.
    #[error("filesystem type already registered: {0}")]
    AlreadyRegistered(String),

    /// Filesystem type was never registered.
    #[error("filesystem type not registered: {0}")]
    NotRegistered(String),

    /// No registered filesystem type with that name.
    #[error("unknown filesystem type: {0}")]
    UnknownFilesystem(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a NoMountPoint error.
    pub fn no_mount_point(path: impl Into<String>) -> Self {
        Self::NoMountPoint(path.into())
    }

    /// Create an AllocationFailure error.
    pub fn allocation_failure(what: impl Into<String>) -> Self {
        Self::AllocationFailure(what.into())
    }

    /// Create a NameCollision error.
    pub fn name_collision(name: impl Into<String>) -> Self {
        Self::NameCollision(name.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::PermissionDenied(msg) => {
                io::Error::new(io::ErrorKind::PermissionDenied, msg)
            }
            VfsError::ReadOnly => {
                io::Error::new(io::ErrorKind::ReadOnlyFilesystem, "filesystem is read-only")
            }
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::NoMountPoint(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AllocationFailure(msg) => io::Error::new(io::ErrorKind::OutOfMemory, msg),
            VfsError::OutOfMemory => io::Error::from(io::ErrorKind::OutOfMemory),
            VfsError::NameCollision(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::NotMounted => io::Error::new(io::ErrorKind::NotFound, "not mounted"),
            VfsError::AlreadyMounted => {
                io::Error::new(io::ErrorKind::ResourceBusy, "already mounted")
            }
            VfsError::AlreadyRegistered(msg) => {
                io::Error::new(io::ErrorKind::AlreadyExists, msg)
            }
            VfsError::NotRegistered(msg) | VfsError::UnknownFilesystem(msg) => {
                io::Error::new(io::ErrorKind::NotFound, msg)
            }
            VfsError::Io(e) => e,
            VfsError::Other(msg) => io::Error::other(msg),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kinds() {
        let e: io::Error = VfsError::name_collision("foo").into();
        assert_eq!(e.kind(), io::ErrorKind::AlreadyExists);

        let e: io::Error = VfsError::OutOfMemory.into();
        assert_eq!(e.kind(), io::ErrorKind::OutOfMemory);

        let e: io::Error = VfsError::UnknownFilesystem("nope".into()).into();
        assert_eq!(e.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            VfsError::allocation_failure("inode for bar").to_string(),
            "allocation failure: inode for bar"
        );
        assert_eq!(VfsError::NotMounted.to_string(), "superblock is not mounted");
    }
}
