//! File content providers.
//!
//! File nodes do not store bytes. Each one is bound to a [`FileOperations`]
//! implementation at allocation time, and reads are dispatched straight to
//! it.

use super::node::Node;
use crate::vfs::{OpenFlags, VfsResult};

/// Content of the demonstration file.
pub const HELLO: &[u8] = b"Hello World!\n";

/// Result of a read dispatched to a content provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes starting at the requested offset.
    Data(Vec<u8>),
    /// Nothing to return for this request.
    EndOfFile,
}

impl ReadOutcome {
    pub fn is_eof(&self) -> bool {
        matches!(self, ReadOutcome::EndOfFile)
    }

    /// Flatten into a byte buffer; end of file is an empty buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ReadOutcome::Data(bytes) => bytes,
            ReadOutcome::EndOfFile => Vec::new(),
        }
    }
}

/// Operations a file node dispatches to.
pub trait FileOperations: Send + Sync {
    /// Open the file. No per-open state is kept by default.
    fn open(&self, _node: &Node, _flags: OpenFlags) -> VfsResult<()> {
        Ok(())
    }

    /// Read at most `max_len` bytes at `offset`.
    fn read(&self, node: &Node, offset: u64, max_len: usize) -> ReadOutcome;

    /// Write `data` at `offset`, returning the number of bytes accepted.
    fn write(&self, node: &Node, offset: u64, data: &[u8]) -> usize;
}

/// Fixed, immutable content served in a single read.
///
/// - Only offset 0 returns data; any later offset is end of file.
/// - The caller's buffer must hold the whole content. Shorter buffers get end
///   of file instead of a truncated prefix.
/// - A successful read stamps the node's size with the content length.
/// - Writes are accepted and discarded: zero bytes written, no error.
#[derive(Debug, Clone, Copy)]
pub struct StaticContent {
    bytes: &'static [u8],
}

impl StaticContent {
    pub const fn new(bytes: &'static [u8]) -> Self {
        Self { bytes }
    }

    /// The `"Hello World!\n"` provider.
    pub const fn hello() -> Self {
        Self::new(HELLO)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl FileOperations for StaticContent {
    fn read(&self, node: &Node, offset: u64, max_len: usize) -> ReadOutcome {
        if offset > 0 || max_len < self.bytes.len() {
            tracing::debug!(ino = node.ino(), offset, max_len, "read past content or short buffer");
            return ReadOutcome::EndOfFile;
        }

        node.set_size(self.bytes.len() as u64);
        tracing::debug!(ino = node.ino(), len = self.bytes.len(), "read file content");
        ReadOutcome::Data(self.bytes.to_vec())
    }

    fn write(&self, node: &Node, offset: u64, data: &[u8]) -> usize {
        tracing::debug!(ino = node.ino(), offset, len = data.len(), "discarding write");
        0
    }
}
