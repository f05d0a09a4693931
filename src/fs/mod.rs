//! The filesystem capability the file server is built on.
//!
//! A [`FileSystem`] opens '/'-separated, already cleaned paths. What it
//! hands back is a [`File`]: a seekable reader for regular files, which can
//! also list its children when it is a directory.
//!
//! Two backends are provided: [`Dir`] reads from a directory on disk, and
//! [`MemFs`] keeps a tree in memory, which is handy for tests.

use std::io;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncSeek};

mod disk;
mod memory;

pub use self::disk::{Dir, DiskFile};
pub use self::memory::{MemFile, MemFs};

/// Metadata about an entry: its own, or one of a directory's children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    name: String,
    len: u64,
    modified: Option<SystemTime>,
    is_dir: bool,
}

impl FileInfo {
    /// Describe an entry.
    pub fn new(
        name: impl Into<String>,
        len: u64,
        modified: Option<SystemTime>,
        is_dir: bool,
    ) -> FileInfo {
        FileInfo {
            name: name.into(),
            len,
            modified,
            is_dir,
        }
    }

    /// The base name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the entry holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Last modification time, if the backend knows it.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// An open entry.
///
/// Reading or seeking a directory fails; listing a regular file fails.
#[async_trait]
pub trait File: AsyncRead + AsyncSeek + Send + Sync + Unpin + 'static {
    /// Metadata of this entry.
    async fn stat(&self) -> io::Result<FileInfo>;

    /// The immediate children of a directory, in no particular order.
    async fn read_dir(&mut self) -> io::Result<Vec<FileInfo>>;
}

/// Something that can open entries by request path.
#[async_trait]
pub trait FileSystem: Send + Sync + 'static {
    /// The handle type returned by [`FileSystem::open`].
    type File: File;

    /// Open a cleaned, rooted, '/'-separated path.
    ///
    /// Errors are reported with the conventional `io::ErrorKind`s:
    /// `NotFound` for missing entries, `PermissionDenied` for refused ones.
    async fn open(&self, name: &str) -> io::Result<Self::File>;
}

pub(crate) fn not_a_directory() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "not a directory")
}

pub(crate) fn is_a_directory() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "is a directory")
}
