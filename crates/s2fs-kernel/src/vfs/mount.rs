//! VFS mount table with longest-prefix routing.
//!
//! Routes filesystem operations to the appropriate mounted filesystem based
//! on path.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::{VfsError, VfsResult};
use super::ops::VfsOps;
use super::registry::{FsRegistry, MountFlags};
use super::types::{DirEntry, FileAttr, FileType, OpenFlags, StatFs};

/// Information about a mount point.
#[derive(Debug, Clone)]
pub struct MountInfo {
    /// The mount path (e.g., "/mnt/s2fs").
    pub path: PathBuf,
    /// Whether this mount is read-only.
    pub read_only: bool,
}

/// Routes filesystem operations to mounted filesystems.
///
/// Mount points are matched by longest prefix. For example, if `/mnt` and
/// `/mnt/s2fs` are both mounted, a path like `/mnt/s2fs/foo/bar` will be
/// routed to the `/mnt/s2fs` mount.
pub struct MountTable {
    /// Mount points, keyed by normalized path.
    mounts: RwLock<BTreeMap<PathBuf, Arc<dyn VfsOps>>>,
}

impl std::fmt::Debug for MountTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountTable")
            .field("mounts", &"<locked>")
            .finish()
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MountTable {
    /// Create a new empty mount table.
    pub fn new() -> Self {
        Self {
            mounts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Mount a filesystem at the given path.
    ///
    /// If a filesystem is already mounted at this path, it is replaced and
    /// released.
    pub async fn mount(&self, path: impl Into<PathBuf>, fs: impl VfsOps + 'static) {
        self.mount_arc(path, Arc::new(fs)).await;
    }

    /// Mount a filesystem (already wrapped in Arc) at the given path.
    pub async fn mount_arc(&self, path: impl Into<PathBuf>, fs: Arc<dyn VfsOps>) {
        let path = Self::normalize_mount_path(path.into());
        let mut mounts = self.mounts.write().await;
        tracing::info!(path = %path.display(), "mounted filesystem");
        if let Some(previous) = mounts.insert(path, fs) {
            previous.release();
        }
    }

    /// Mount a fresh instance of a registered filesystem type.
    pub async fn mount_type(
        &self,
        path: impl Into<PathBuf>,
        registry: &FsRegistry,
        fs_type: &str,
        flags: MountFlags,
        data: Option<&str>,
    ) -> VfsResult<()> {
        let path = path.into();
        let fs = registry.mount(fs_type, flags, data).inspect_err(|e| {
            tracing::warn!(path = %path.display(), fs_type, error = %e, "mount failed");
        })?;
        self.mount_arc(path, fs).await;
        Ok(())
    }

    /// Unmount the filesystem at the given path.
    ///
    /// The detached filesystem is released. Returns `true` if a mount was
    /// removed, `false` if nothing was mounted there.
    pub async fn unmount(&self, path: impl AsRef<Path>) -> bool {
        let path = Self::normalize_mount_path(path.as_ref().to_path_buf());
        let removed = self.mounts.write().await.remove(&path);
        match removed {
            Some(fs) => {
                fs.release();
                tracing::info!(path = %path.display(), "unmounted filesystem");
                true
            }
            None => false,
        }
    }

    /// List all current mounts.
    pub async fn list_mounts(&self) -> Vec<MountInfo> {
        let mounts = self.mounts.read().await;
        mounts
            .iter()
            .map(|(path, fs)| MountInfo {
                path: path.clone(),
                read_only: fs.read_only(),
            })
            .collect()
    }

    /// Normalize a path: absolute, no trailing slash, `.` and `..` resolved
    /// lexically. `..` at `/` stays at `/`.
    fn normalize_mount_path(path: PathBuf) -> PathBuf {
        let mut normalized = PathBuf::from("/");
        for component in path.components() {
            match component {
                Component::Normal(name) => normalized.push(name),
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        normalized
    }

    /// Find the mount point for a given path.
    ///
    /// Returns the mount and the path relative to that mount.
    async fn find_mount(&self, path: &Path) -> VfsResult<(Arc<dyn VfsOps>, PathBuf)> {
        let normalized = Self::normalize_mount_path(path.to_path_buf());
        let normalized_str = normalized.to_string_lossy();

        let mounts = self.mounts.read().await;

        // Longest matching mount point wins
        let best_match = mounts
            .iter()
            .filter(|(mount_path, _)| {
                let mount_str = mount_path.to_string_lossy();
                mount_str == "/"
                    || normalized_str == mount_str
                    || normalized_str.starts_with(&format!("{}/", mount_str))
            })
            .max_by_key(|(mount_path, _)| mount_path.as_os_str().len());

        match best_match {
            Some((mount_path, fs)) => {
                let relative = normalized
                    .strip_prefix(mount_path)
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                Ok((Arc::clone(fs), relative))
            }
            None => Err(VfsError::no_mount_point(path.display().to_string())),
        }
    }

    /// List the root directory, synthesizing entries from mount points.
    async fn list_root(&self) -> VfsResult<Vec<DirEntry>> {
        let mounts = self.mounts.read().await;
        let mut entries = Vec::new();
        let mut seen_names = std::collections::HashSet::new();

        for (mount_path, fs) in mounts.iter() {
            let mount_str = mount_path.to_string_lossy();
            if mount_str == "/" {
                // Root mount: list its contents directly
                if let Ok(root_entries) = fs.readdir(Path::new("")).await {
                    for entry in root_entries {
                        if seen_names.insert(entry.name.clone()) {
                            entries.push(entry);
                        }
                    }
                }
            } else {
                // Non-root mount: extract first path component
                let first_component = mount_str
                    .trim_start_matches('/')
                    .split('/')
                    .next()
                    .unwrap_or("");

                if !first_component.is_empty() && seen_names.insert(first_component.to_string()) {
                    entries.push(DirEntry::new(first_component, FileType::Directory, 0));
                }
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn is_root(path: &Path) -> bool {
        Self::normalize_mount_path(path.to_path_buf()) == Path::new("/")
    }
}

#[async_trait]
impl VfsOps for MountTable {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        match self.find_mount(path).await {
            Ok((fs, relative)) => fs.getattr(&relative).await,
            // Root always exists, even with nothing mounted on it
            Err(_) if Self::is_root(path) => Ok(FileAttr::directory(0, 0o755)),
            Err(e) => Err(e),
        }
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        if Self::is_root(path) {
            return self.list_root().await;
        }

        let (fs, relative) = self.find_mount(path).await?;
        fs.readdir(&relative).await
    }

    async fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<FileAttr> {
        let (fs, relative) = self.find_mount(path).await?;
        fs.open(&relative, flags).await
    }

    async fn read(&self, path: &Path, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        let (fs, relative) = self.find_mount(path).await?;
        fs.read(&relative, offset, size).await
    }

    async fn write(&self, path: &Path, offset: u64, data: &[u8]) -> VfsResult<u32> {
        let (fs, relative) = self.find_mount(path).await?;
        fs.write(&relative, offset, data).await
    }

    fn read_only(&self) -> bool {
        // Mount table itself isn't read-only; individual mounts might be
        false
    }

    async fn statfs(&self) -> VfsResult<StatFs> {
        let mounts = self.mounts.read().await;
        match mounts.get(Path::new("/")) {
            Some(root_fs) => root_fs.statfs().await,
            None => Err(VfsError::no_mount_point("/")),
        }
    }

    fn release(&self) {
        // Nested tables release everything they still hold
        match self.mounts.try_write() {
            Ok(mut mounts) => {
                for (_, fs) in std::mem::take(&mut *mounts) {
                    fs.release();
                }
            }
            Err(_) => {
                tracing::warn!("mount table busy, skipping release of nested mounts");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Single-file filesystem used to exercise routing.
    struct OneFile {
        ino: u64,
        content: &'static [u8],
        released: Arc<AtomicBool>,
    }

    impl OneFile {
        fn new(ino: u64, content: &'static [u8]) -> Self {
            Self {
                ino,
                content,
                released: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl VfsOps for OneFile {
        async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
            if path.as_os_str().is_empty() {
                Ok(FileAttr::directory(self.ino, 0o755))
            } else if path == Path::new("file") {
                Ok(FileAttr::file(self.ino + 1, self.content.len() as u64, 0o644))
            } else {
                Err(VfsError::not_found(path.display().to_string()))
            }
        }

        async fn readdir(&self, _path: &Path) -> VfsResult<Vec<DirEntry>> {
            Ok(vec![DirEntry::file("file", self.ino + 1)])
        }

        async fn open(&self, path: &Path, _flags: OpenFlags) -> VfsResult<FileAttr> {
            self.getattr(path).await
        }

        async fn read(&self, path: &Path, _offset: u64, _size: u32) -> VfsResult<Vec<u8>> {
            self.getattr(path).await?;
            Ok(self.content.to_vec())
        }

        async fn write(&self, _path: &Path, _offset: u64, _data: &[u8]) -> VfsResult<u32> {
            Err(VfsError::ReadOnly)
        }

        fn read_only(&self) -> bool {
            true
        }

        async fn statfs(&self) -> VfsResult<StatFs> {
            Ok(StatFs::in_memory(0xabcd, 4096, 2))
        }

        fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_basic_mount() {
        let table = MountTable::new();
        table.mount("/scratch", OneFile::new(1, b"hello")).await;

        let data = table
            .read(Path::new("/scratch/file"), 0, 100)
            .await
            .unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn test_nested_mount() {
        let table = MountTable::new();
        table.mount("/mnt", OneFile::new(1, b"outer")).await;
        table.mount("/mnt/project", OneFile::new(10, b"inner")).await;

        assert_eq!(
            table.read(Path::new("/mnt/file"), 0, 100).await.unwrap(),
            b"outer"
        );
        assert_eq!(
            table.read(Path::new("/mnt/project/file"), 0, 100).await.unwrap(),
            b"inner"
        );
    }

    #[tokio::test]
    async fn test_list_root() {
        let table = MountTable::new();
        table.mount("/scratch", OneFile::new(1, b"")).await;
        table.mount("/mnt/a", OneFile::new(1, b"")).await;
        table.mount("/mnt/b", OneFile::new(1, b"")).await;

        let entries = table.readdir(Path::new("/")).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["mnt", "scratch"]);
    }

    #[tokio::test]
    async fn test_unmount_releases() {
        let table = MountTable::new();
        let fs = OneFile::new(1, b"data");
        let released = Arc::clone(&fs.released);
        table.mount("/scratch", fs).await;

        assert!(table.read(Path::new("/scratch/file"), 0, 100).await.is_ok());

        assert!(table.unmount("/scratch/").await);
        assert!(released.load(Ordering::SeqCst));
        assert!(!table.unmount("/scratch").await);

        let result = table.read(Path::new("/scratch/file"), 0, 100).await;
        assert!(matches!(result, Err(VfsError::NoMountPoint(_))));
    }

    #[tokio::test]
    async fn test_remount_releases_previous() {
        let table = MountTable::new();
        let first = OneFile::new(1, b"one");
        let released = Arc::clone(&first.released);
        table.mount("/x", first).await;
        table.mount("/x", OneFile::new(1, b"two")).await;

        assert!(released.load(Ordering::SeqCst));
        assert_eq!(table.read(Path::new("/x/file"), 0, 100).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_list_mounts() {
        let table = MountTable::new();
        table.mount("scratch", OneFile::new(1, b"")).await;
        table.mount("/data/", OneFile::new(1, b"")).await;

        let mounts = table.list_mounts().await;
        assert_eq!(mounts.len(), 2);

        let paths: Vec<_> = mounts.iter().map(|m| &m.path).collect();
        assert!(paths.contains(&&PathBuf::from("/scratch")));
        assert!(paths.contains(&&PathBuf::from("/data")));
        assert!(mounts.iter().all(|m| m.read_only));
    }

    #[tokio::test]
    async fn test_no_mount_error() {
        let table = MountTable::new();
        let result = table.read(Path::new("/nothing/here.txt"), 0, 100).await;
        assert!(matches!(result, Err(VfsError::NoMountPoint(_))));
    }

    #[tokio::test]
    async fn test_mount_point_resolves_to_fs_root() {
        let table = MountTable::new();
        table.mount("/scratch", OneFile::new(42, b"")).await;

        let attr = table.getattr(Path::new("/scratch")).await.unwrap();
        assert!(attr.is_dir());
        assert_eq!(attr.ino, 42);
    }

    #[tokio::test]
    async fn test_stat_root_without_mounts() {
        let table = MountTable::new();
        let attr = table.getattr(Path::new("/")).await.unwrap();
        assert!(attr.is_dir());
        assert!(table.statfs().await.is_err());
    }

    #[tokio::test]
    async fn test_root_mount() {
        let table = MountTable::new();
        table.mount("/", OneFile::new(1, b"root file")).await;

        let data = table.read(Path::new("/file"), 0, 100).await.unwrap();
        assert_eq!(data, b"root file");
        assert_eq!(table.statfs().await.unwrap().fs_type, 0xabcd);
    }

    #[tokio::test]
    async fn test_dot_dot_resolved_before_routing() {
        let table = MountTable::new();
        table.mount("/mnt/a", OneFile::new(1, b"inside")).await;

        assert_eq!(
            table.read(Path::new("/mnt/a/../a/./file"), 0, 100).await.unwrap(),
            b"inside"
        );

        // Climbing out of the mount leaves it instead of clamping at its root
        assert!(matches!(
            table.getattr(Path::new("/mnt/a/..")).await,
            Err(VfsError::NoMountPoint(_))
        ));
        let root = table.getattr(Path::new("/mnt/a/../../..")).await.unwrap();
        assert_eq!(root.ino, 0);
        let names: Vec<_> = table
            .readdir(Path::new("/mnt/.."))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["mnt"]);
    }

    #[test]
    fn test_normalize_mount_path() {
        let cases = [
            ("", "/"),
            ("/", "/"),
            ("scratch/", "/scratch"),
            ("/mnt//s2fs/", "/mnt/s2fs"),
            ("/mnt/./s2fs/../x", "/mnt/x"),
            ("/../..", "/"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                MountTable::normalize_mount_path(PathBuf::from(input)),
                PathBuf::from(expected),
                "{input}"
            );
        }
    }

    #[tokio::test]
    async fn test_release_drains_nested_mounts() {
        let table = MountTable::new();
        let fs = OneFile::new(1, b"");
        let released = Arc::clone(&fs.released);
        table.mount("/scratch", fs).await;

        table.release();
        assert!(released.load(Ordering::SeqCst));
        assert!(table.list_mounts().await.is_empty());
    }

    #[tokio::test]
    async fn test_release_skipped_while_table_busy() {
        let table = MountTable::new();
        let fs = OneFile::new(1, b"");
        let released = Arc::clone(&fs.released);
        table.mount("/scratch", fs).await;

        let guard = table.mounts.read().await;
        table.release();
        drop(guard);

        assert!(!released.load(Ordering::SeqCst));
        assert_eq!(table.list_mounts().await.len(), 1);
    }
}
