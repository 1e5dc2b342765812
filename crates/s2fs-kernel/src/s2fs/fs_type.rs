//! The s2fs filesystem type and its mounted handle.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::content::{FileOperations, StaticContent};
use super::dentry::Dentry;
use super::node::NodeOps;
use super::superblock::SuperBlock;
use super::tree::Layout;
use super::FS_NAME;
use crate::vfs::{
    DirEntry, FileAttr, FileSystemType, FsRegistry, MountFlags, OpenFlags, StatFs, VfsError,
    VfsOps, VfsResult,
};

/// The s2fs filesystem type.
///
/// Every mount gets its own [`SuperBlock`] and a freshly built tree.
pub struct S2fs {
    layout: Arc<Layout>,
    content: Arc<dyn FileOperations>,
    node_limit: u64,
}

impl std::fmt::Debug for S2fs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S2fs")
            .field("layout", &self.layout)
            .field("node_limit", &self.node_limit)
            .finish()
    }
}

impl Default for S2fs {
    fn default() -> Self {
        Self::new()
    }
}

impl S2fs {
    /// `foo/bar` serving `"Hello World!\n"`.
    pub fn new() -> Self {
        Self::with_layout(Layout::demo())
    }

    /// Same filesystem type, different tree shape.
    pub fn with_layout(layout: Layout) -> Self {
        Self {
            layout: Arc::new(layout),
            content: Arc::new(StaticContent::hello()),
            node_limit: u64::MAX,
        }
    }

    /// Cap the node ids each mount may allocate.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = limit;
        self
    }

    /// Register this type with `registry`.
    pub fn register(self: &Arc<Self>, registry: &FsRegistry) -> VfsResult<()> {
        registry.register(Arc::clone(self) as Arc<dyn FileSystemType>)
    }

    /// Remove this type from `registry`.
    pub fn unregister(&self, registry: &FsRegistry) -> VfsResult<()> {
        registry.unregister(FS_NAME).map(|_| ())
    }

    /// Construct and fill a new superblock.
    pub fn mount_fs(&self, flags: MountFlags, data: Option<&str>) -> VfsResult<S2fsMount> {
        let sb = SuperBlock::new(
            flags,
            self.node_limit,
            Arc::clone(&self.layout),
            Arc::clone(&self.content),
        );
        match sb.fill(data) {
            Ok(root) => {
                tracing::info!(fs_type = FS_NAME, ?flags, "mounted");
                Ok(S2fsMount {
                    sb: Arc::new(sb),
                    root_ino: root.node().ino(),
                })
            }
            Err(e) => {
                if !flags.contains(MountFlags::SILENT) {
                    tracing::warn!(fs_type = FS_NAME, error = %e, "fill_super failed");
                }
                Err(e)
            }
        }
    }
}

impl FileSystemType for S2fs {
    fn name(&self) -> &'static str {
        FS_NAME
    }

    fn mount(&self, flags: MountFlags, data: Option<&str>) -> VfsResult<Arc<dyn VfsOps>> {
        Ok(Arc::new(self.mount_fs(flags, data)?))
    }
}

/// Register the default s2fs type with the process-wide registry.
pub fn init() -> VfsResult<()> {
    Arc::new(S2fs::new()).register(FsRegistry::global())
}

/// Remove s2fs from the process-wide registry.
pub fn exit() -> VfsResult<()> {
    S2fs::new().unregister(FsRegistry::global())
}

/// A mounted s2fs instance.
///
/// Serves host operations by walking the dentry tree of its superblock.
/// Once released, every operation fails with [`VfsError::NotMounted`].
#[derive(Debug, Clone)]
pub struct S2fsMount {
    sb: Arc<SuperBlock>,
    root_ino: u64,
}

impl S2fsMount {
    pub fn superblock(&self) -> &Arc<SuperBlock> {
        &self.sb
    }

    /// Root entry of the tree.
    pub fn root(&self) -> VfsResult<Arc<Dentry>> {
        self.sb.root()
    }

    pub fn root_ino(&self) -> u64 {
        self.root_ino
    }

    /// Resolve a mount-relative path to its entry.
    pub fn resolve(&self, path: &Path) -> VfsResult<Arc<Dentry>> {
        self.root()?.resolve(path)
    }

    fn file_ops(entry: &Dentry) -> VfsResult<&Arc<dyn FileOperations>> {
        entry
            .node()
            .file_ops()
            .ok_or_else(|| VfsError::is_a_directory(entry.path()))
    }
}

#[async_trait]
impl VfsOps for S2fsMount {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        Ok(self.resolve(path)?.node().attr())
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let dir = self.resolve(path)?;
        if !dir.node().is_dir() {
            return Err(VfsError::not_a_directory(dir.path()));
        }
        Ok(dir
            .children()
            .iter()
            .map(|child| DirEntry::new(child.name(), child.node().kind(), child.node().ino()))
            .collect())
    }

    async fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<FileAttr> {
        let entry = self.resolve(path)?;
        if flags.wants_write() && self.read_only() {
            return Err(VfsError::ReadOnly);
        }
        match entry.node().ops() {
            NodeOps::Directory if flags.wants_write() => {
                Err(VfsError::is_a_directory(entry.path()))
            }
            NodeOps::Directory => Ok(entry.node().attr()),
            NodeOps::File(ops) => {
                ops.open(entry.node(), flags)?;
                Ok(entry.node().attr())
            }
        }
    }

    async fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        let entry = self.resolve(path)?;
        let ops = Self::file_ops(&entry)?;
        Ok(ops.read(entry.node(), offset, size as usize).into_bytes())
    }

    async fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32> {
        let entry = self.resolve(path)?;
        let ops = Self::file_ops(&entry)?;
        Ok(ops.write(entry.node(), offset, data) as u32)
    }

    fn read_only(&self) -> bool {
        self.sb.flags().contains(MountFlags::RDONLY)
    }

    async fn statfs(&self) -> VfsResult<StatFs> {
        self.sb.stat()
    }

    fn release(&self) {
        self.sb.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2fs::superblock::SuperState;
    use crate::s2fs::tree::LayoutEntry;

    #[tokio::test]
    async fn test_mount_shape() {
        let mount = S2fs::new().mount_fs(MountFlags::empty(), None).unwrap();

        let root = mount.readdir(Path::new("")).await.unwrap();
        assert_eq!(root, vec![DirEntry::directory("foo", 2)]);

        let foo = mount.readdir(Path::new("foo")).await.unwrap();
        assert_eq!(foo, vec![DirEntry::file("bar", 3)]);
        assert_eq!(mount.root_ino(), 1);
    }

    #[tokio::test]
    async fn test_read_contract() {
        let mount = S2fs::new().mount_fs(MountFlags::empty(), None).unwrap();
        let bar = Path::new("foo/bar");

        assert_eq!(mount.getattr(bar).await.unwrap().size, 0);
        assert!(mount.read(bar, 0, 12).await.unwrap().is_empty());
        assert!(mount.read(bar, 1, 100).await.unwrap().is_empty());
        assert_eq!(mount.getattr(bar).await.unwrap().size, 0);

        assert_eq!(mount.read(bar, 0, 13).await.unwrap(), b"Hello World!\n");
        assert_eq!(mount.getattr(bar).await.unwrap().size, 13);
    }

    #[tokio::test]
    async fn test_write_is_noop() {
        let mount = S2fs::new().mount_fs(MountFlags::empty(), None).unwrap();
        let bar = Path::new("/foo/bar");
        assert_eq!(mount.write(bar, 0, b"overwrite").await.unwrap(), 0);
        assert_eq!(mount.read(bar, 0, 64).await.unwrap(), b"Hello World!\n");
    }

    #[tokio::test]
    async fn test_directory_io_errors() {
        let mount = S2fs::new().mount_fs(MountFlags::empty(), None).unwrap();
        assert!(matches!(
            mount.read(Path::new("foo"), 0, 64).await,
            Err(VfsError::IsADirectory(_))
        ));
        assert!(matches!(
            mount.write(Path::new("foo"), 0, b"x").await,
            Err(VfsError::IsADirectory(_))
        ));
        assert!(matches!(
            mount.readdir(Path::new("foo/bar")).await,
            Err(VfsError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_open() {
        let mount = S2fs::new().mount_fs(MountFlags::empty(), None).unwrap();
        let attr = mount.open(Path::new("foo/bar"), OpenFlags::write()).await.unwrap();
        assert!(attr.is_file());
        assert!(mount.open(Path::new("foo"), OpenFlags::read()).await.unwrap().is_dir());
        assert!(mount.open(Path::new("foo"), OpenFlags::write()).await.is_err());
        assert!(matches!(
            mount.open(Path::new("missing"), OpenFlags::read()).await,
            Err(VfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_only_mount_refuses_write_open() {
        let mount = S2fs::new().mount_fs(MountFlags::RDONLY, None).unwrap();
        assert!(mount.read_only());
        assert!(matches!(
            mount.open(Path::new("foo/bar"), OpenFlags::write()).await,
            Err(VfsError::ReadOnly)
        ));
        assert!(mount.open(Path::new("foo/bar"), OpenFlags::read()).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_kills_superblock() {
        let mount = S2fs::new().mount_fs(MountFlags::empty(), None).unwrap();
        mount.release();
        assert_eq!(mount.superblock().state(), SuperState::Unmounted);
        assert!(matches!(
            mount.getattr(Path::new("foo")).await,
            Err(VfsError::NotMounted)
        ));
        assert!(matches!(mount.statfs().await, Err(VfsError::NotMounted)));
    }

    #[test]
    fn test_mount_failures() {
        let dup = Layout::new(vec![
            LayoutEntry::dir("foo", vec![]),
            LayoutEntry::dir("foo", vec![]),
        ]);
        let err = S2fs::with_layout(dup)
            .mount_fs(MountFlags::SILENT, None)
            .unwrap_err();
        assert!(matches!(err, VfsError::NameCollision(_)));

        let err = S2fs::new()
            .with_node_limit(2)
            .mount_fs(MountFlags::empty(), None)
            .unwrap_err();
        assert!(matches!(err, VfsError::AllocationFailure(_)));
    }

    #[test]
    fn test_register_with_local_registry() {
        let registry = FsRegistry::new();
        let fs = Arc::new(S2fs::new());
        fs.register(&registry).unwrap();
        assert!(matches!(
            fs.register(&registry),
            Err(VfsError::AlreadyRegistered(_))
        ));
        assert_eq!(registry.names(), vec!["s2fs"]);

        fs.unregister(&registry).unwrap();
        assert!(matches!(
            fs.unregister(&registry),
            Err(VfsError::NotRegistered(_))
        ));
        fs.register(&registry).unwrap();
    }
}
