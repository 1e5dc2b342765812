//! s2fs command-line host.
//!
//! Registers s2fs, mounts a fresh instance into a [`MountTable`] and runs a
//! single command against it.
//!
//! Usage:
//!   s2fs tree
//!   s2fs cat /mnt/s2fs/foo/bar
//!   s2fs --read-only write foo/bar "ignored"
//!   RUST_LOG=s2fs_kernel=debug s2fs stat --json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use s2fs_kernel::s2fs::FS_NAME;
use s2fs_kernel::{
    FileAttr, FileType, FsRegistry, MountTable, OpenFlags, S2fsConfig, VfsError, VfsOps,
};

/// Mount s2fs and inspect it.
#[derive(Parser, Debug)]
#[command(name = "s2fs")]
#[command(about = "Mount the s2fs demo filesystem and run one command against it")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to mount (overrides the config file)
    #[arg(long)]
    mount_point: Option<PathBuf>,

    /// Mount read-only
    #[arg(long)]
    read_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the mounted tree
    Tree {
        #[arg(long)]
        json: bool,
    },
    /// Print file contents
    Cat {
        path: PathBuf,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 4096)]
        size: u32,
    },
    /// Print attributes of a path, or filesystem statistics
    Stat {
        path: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Write data to a file and report how much was accepted
    Write { path: PathBuf, data: String },
    /// List registered filesystem types
    Types,
}

impl Cli {
    /// Config file values with command-line overrides applied.
    fn config(&self) -> Result<S2fsConfig> {
        let mut config = match &self.config {
            Some(path) => S2fsConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => S2fsConfig::default(),
        };
        if let Some(mount_point) = &self.mount_point {
            config.mount_point = mount_point.clone();
        }
        if self.read_only {
            config.read_only = true;
        }
        Ok(config)
    }
}

/// A mount table with one s2fs instance in it.
struct Host {
    table: MountTable,
    fs: Arc<dyn VfsOps>,
    mount_point: PathBuf,
}

impl Host {
    async fn mount(config: &S2fsConfig, registry: &FsRegistry) -> Result<Self> {
        let fs = registry
            .mount(FS_NAME, config.mount_flags(), config.mount_data.as_deref())
            .with_context(|| format!("mounting {FS_NAME} at {}", config.mount_point.display()))?;

        let table = MountTable::new();
        table.mount_arc(&config.mount_point, Arc::clone(&fs)).await;
        Ok(Self {
            table,
            fs,
            mount_point: config.mount_point.clone(),
        })
    }

    async fn unmount(self) {
        self.table.unmount(&self.mount_point).await;
    }

    /// Relative paths are taken from the mount point.
    fn host_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.mount_point.join(path)
        }
    }

    async fn tree(&self) -> Result<TreeNode> {
        let name = self.mount_point.display().to_string();
        collect_tree(&self.table, &self.mount_point, name).await
    }
}

/// One node of the printed tree.
#[derive(Debug, Serialize)]
struct TreeNode {
    name: String,
    ino: u64,
    kind: FileType,
    mode: String,
    size: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(name: String, attr: &FileAttr) -> Self {
        Self {
            name,
            ino: attr.ino,
            kind: attr.kind,
            mode: format!("{:o}", attr.mode()),
            size: attr.size,
            children: Vec::new(),
        }
    }

    fn render(&self, depth: usize, out: &mut String) {
        let suffix = if self.kind.is_dir() && depth > 0 { "/" } else { "" };
        out.push_str(&format!(
            "{:indent$}{}{}  ino={} mode={} size={}\n",
            "",
            self.name,
            suffix,
            self.ino,
            self.mode,
            self.size,
            indent = depth * 2
        ));
        for child in &self.children {
            child.render(depth + 1, out);
        }
    }
}

async fn collect_tree(fs: &dyn VfsOps, path: &Path, name: String) -> Result<TreeNode> {
    let attr = fs.getattr(path).await?;
    let mut node = TreeNode::new(name, &attr);
    if attr.is_dir() {
        for entry in fs.readdir(path).await? {
            let child = Box::pin(collect_tree(fs, &path.join(&entry.name), entry.name)).await?;
            node.children.push(child);
        }
    }
    Ok(node)
}

fn render_attr(path: &Path, attr: &FileAttr) -> String {
    format!(
        "path:  {}\nino:   {}\nkind:  {:?}\nmode:  {:o}\nsize:  {}\nnlink: {}\n",
        path.display(),
        attr.ino,
        attr.kind,
        attr.mode(),
        attr.size,
        attr.nlink
    )
}

async fn run_command(host: &Host, command: &Command, registry: &FsRegistry) -> Result<String> {
    let output = match command {
        Command::Tree { json } => {
            let tree = host.tree().await?;
            if *json {
                serde_json::to_string_pretty(&tree)? + "\n"
            } else {
                let mut out = String::new();
                tree.render(0, &mut out);
                out
            }
        }
        Command::Cat { path, offset, size } => {
            let path = host.host_path(path);
            let bytes = host
                .table
                .read(&path, *offset, *size)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        Command::Stat { path: Some(path), json } => {
            let path = host.host_path(path);
            let attr = host
                .table
                .getattr(&path)
                .await
                .with_context(|| format!("stat {}", path.display()))?;
            if *json {
                serde_json::to_string_pretty(&attr)? + "\n"
            } else {
                render_attr(&path, &attr)
            }
        }
        Command::Stat { path: None, json } => {
            let st = host.fs.statfs().await?;
            if *json {
                serde_json::to_string_pretty(&st)? + "\n"
            } else {
                format!(
                    "type:  {:#x}\nbsize: {}\nfiles: {}\n",
                    st.fs_type, st.bsize, st.files
                )
            }
        }
        Command::Write { path, data } => {
            let path = host.host_path(path);
            host.table
                .open(&path, OpenFlags::write())
                .await
                .with_context(|| format!("opening {} for write", path.display()))?;
            let written = host.table.write(&path, 0, data.as_bytes()).await?;
            format!("wrote {written} of {} bytes\n", data.len())
        }
        Command::Types => registry
            .names()
            .iter()
            .map(|name| format!("{name}\n"))
            .collect(),
    };
    Ok(output)
}

async fn run(cli: Cli, config: S2fsConfig) -> Result<()> {
    let registry = FsRegistry::global();
    match s2fs_kernel::s2fs::init() {
        Ok(()) | Err(VfsError::AlreadyRegistered(_)) => {}
        Err(e) => return Err(e).context("registering s2fs"),
    }

    let host = Host::mount(&config, registry).await?;
    let result = run_command(&host, &cli.command, registry).await;
    host.unmount().await;

    let output = result?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_filter.as_deref().unwrap_or("info"))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
