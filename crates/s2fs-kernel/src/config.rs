//! Host-side configuration.
//!
//! The filesystem itself takes no options. What can be configured is how the
//! host mounts it: where, with which flags, and how chatty logging is.
//!
//! ```toml
//! mount_point = "/mnt/s2fs"
//! read_only = true
//! log_filter = "s2fs_kernel=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::vfs::MountFlags;

/// Default mount point.
pub const DEFAULT_MOUNT_POINT: &str = "/mnt/s2fs";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`S2fsConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the host mounts s2fs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S2fsConfig {
    /// Where the filesystem appears in the host namespace.
    pub mount_point: PathBuf,

    /// Mount with [`MountFlags::RDONLY`].
    pub read_only: bool,

    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,

    /// Opaque mount data handed to the filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_data: Option<String>,
}

impl Default for S2fsConfig {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            read_only: false,
            log_filter: None,
            mount_data: None,
        }
    }
}

impl S2fsConfig {
    /// Parse from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Set the mount point.
    pub fn with_mount_point(mut self, mount_point: impl Into<PathBuf>) -> Self {
        self.mount_point = mount_point.into();
        self
    }

    /// Set read-only mounting.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Flags for the mount request.
    pub fn mount_flags(&self) -> MountFlags {
        if self.read_only {
            MountFlags::RDONLY
        } else {
            MountFlags::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = S2fsConfig::from_toml("").unwrap();
        assert_eq!(config, S2fsConfig::default());
        assert_eq!(config.mount_point, PathBuf::from("/mnt/s2fs"));
        assert_eq!(config.mount_flags(), MountFlags::empty());
    }

    #[test]
    fn test_parse_full() {
        let config = S2fsConfig::from_toml(
            r#"
            mount_point = "/data/demo"
            read_only = true
            log_filter = "debug"
            mount_data = "mode=0755"
            "#,
        )
        .unwrap();
        assert_eq!(config.mount_point, PathBuf::from("/data/demo"));
        assert_eq!(config.mount_flags(), MountFlags::RDONLY);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
        assert_eq!(config.mount_data.as_deref(), Some("mode=0755"));
    }

    #[test]
    fn test_parse_error() {
        let err = S2fsConfig::from_toml("read_only = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mount_point = \"/elsewhere\"").unwrap();

        let config = S2fsConfig::load(file.path()).unwrap();
        assert_eq!(config.mount_point, PathBuf::from("/elsewhere"));
        assert!(!config.read_only);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = S2fsConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_builders() {
        let config = S2fsConfig::default()
            .with_mount_point("/x")
            .with_read_only(true);
        assert_eq!(config.mount_point, PathBuf::from("/x"));
        assert!(config.read_only);
    }
}
