//! Filesystem type registry.
//!
//! A filesystem type is registered once under a unique name, and mount
//! requests are resolved by that name. There is one process-wide registry
//! ([`FsRegistry::global`]); local registries can be created for isolation.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use super::error::{VfsError, VfsResult};
use super::ops::VfsOps;

bitflags::bitflags! {
    /// Flags passed with a mount request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MountFlags: u64 {
        const RDONLY = 1 << 0;
        const NOEXEC = 1 << 3;
        const SILENT = 1 << 15;
    }
}

/// A mountable filesystem type.
pub trait FileSystemType: Send + Sync {
    /// Name used in mount requests (e.g. `"s2fs"`).
    fn name(&self) -> &'static str;

    /// Create a fresh, fully populated instance of this filesystem.
    fn mount(&self, flags: MountFlags, data: Option<&str>) -> VfsResult<Arc<dyn VfsOps>>;
}

static GLOBAL: LazyLock<FsRegistry> = LazyLock::new(FsRegistry::new);

/// Registered filesystem types, keyed by name.
pub struct FsRegistry {
    types: RwLock<BTreeMap<&'static str, Arc<dyn FileSystemType>>>,
}

impl std::fmt::Debug for FsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsRegistry")
            .field("types", &self.names())
            .finish()
    }
}

impl Default for FsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(BTreeMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static FsRegistry {
        &GLOBAL
    }

    /// Register a filesystem type.
    ///
    /// Fails with [`VfsError::AlreadyRegistered`] if the name is taken.
    pub fn register(&self, fs_type: Arc<dyn FileSystemType>) -> VfsResult<()> {
        let name = fs_type.name();
        let mut types = self.types.write();
        if types.contains_key(name) {
            tracing::warn!(fs_type = name, "filesystem type already registered");
            return Err(VfsError::AlreadyRegistered(name.to_string()));
        }
        types.insert(name, fs_type);
        tracing::info!(fs_type = name, "registered filesystem type");
        Ok(())
    }

    /// Unregister a filesystem type, returning it.
    ///
    /// Mounts already created from it are unaffected.
    pub fn unregister(&self, name: &str) -> VfsResult<Arc<dyn FileSystemType>> {
        let removed = self.types.write().remove(name);
        match removed {
            Some(fs_type) => {
                tracing::info!(fs_type = name, "unregistered filesystem type");
                Ok(fs_type)
            }
            None => Err(VfsError::NotRegistered(name.to_string())),
        }
    }

    /// Lookup a filesystem type by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn FileSystemType>> {
        self.types.read().get(name).cloned()
    }

    /// Names of all registered types, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.types.read().keys().copied().collect()
    }

    /// Mount a new instance of the named filesystem type.
    pub fn mount(
        &self,
        name: &str,
        flags: MountFlags,
        data: Option<&str>,
    ) -> VfsResult<Arc<dyn VfsOps>> {
        let fs_type = self
            .lookup(name)
            .ok_or_else(|| VfsError::UnknownFilesystem(name.to_string()))?;
        fs_type.mount(flags, data)
    }
}
