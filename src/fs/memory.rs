//! An in-memory [`FileSystem`], mostly for tests.

use std::collections::BTreeMap;
use std::io::{self, Cursor, SeekFrom};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use super::{File, FileInfo, FileSystem};
use crate::path;

#[derive(Clone, Debug)]
struct Node {
    // `None` for directories.
    contents: Option<Bytes>,
    modified: Option<SystemTime>,
    denied: bool,
    unreadable: bool,
}

impl Node {
    fn dir(modified: Option<SystemTime>) -> Node {
        Node {
            contents: None,
            modified,
            denied: false,
            unreadable: false,
        }
    }
}

/// An in-memory tree of files and directories.
///
/// Paths given to the builder methods are cleaned the same way request
/// paths are; missing parent directories are created on the way.
///
/// # Example
///
/// ```
/// use std::time::SystemTime;
/// use dirserve::fs::MemFs;
///
/// let fs = MemFs::new()
///     .file("/docs/readme.txt", "hello", Some(SystemTime::now()))
///     .dir("/empty", None)
///     .deny("/private");
/// ```
#[derive(Clone, Debug)]
pub struct MemFs {
    nodes: Arc<BTreeMap<String, Node>>,
}

impl Default for MemFs {
    fn default() -> Self {
        MemFs::new()
    }
}

impl MemFs {
    /// A tree holding only the root directory.
    pub fn new() -> MemFs {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_owned(), Node::dir(None));
        MemFs {
            nodes: Arc::new(nodes),
        }
    }

    /// Add a regular file.
    pub fn file(
        mut self,
        name: &str,
        contents: impl Into<Bytes>,
        modified: Option<SystemTime>,
    ) -> MemFs {
        let name = path::clean(name);
        self.make_parents(&name);
        Arc::make_mut(&mut self.nodes).insert(
            name,
            Node {
                contents: Some(contents.into()),
                modified,
                denied: false,
                unreadable: false,
            },
        );
        self
    }

    /// Add a directory, or set the modification time of an existing one.
    pub fn dir(mut self, name: &str, modified: Option<SystemTime>) -> MemFs {
        let name = path::clean(name);
        self.make_parents(&name);
        Arc::make_mut(&mut self.nodes)
            .entry(name)
            .and_modify(|node| node.modified = modified)
            .or_insert_with(|| Node::dir(modified));
        self
    }

    /// Refuse to open an entry, and everything below it, with
    /// `PermissionDenied`. The entry is created as a directory if missing.
    pub fn deny(mut self, name: &str) -> MemFs {
        self = self.ensure(name);
        if let Some(node) = Arc::make_mut(&mut self.nodes).get_mut(&path::clean(name)) {
            node.denied = true;
        }
        self
    }

    /// Make listing a directory fail. The directory is created if missing.
    pub fn unreadable(mut self, name: &str) -> MemFs {
        self = self.ensure(name);
        if let Some(node) = Arc::make_mut(&mut self.nodes).get_mut(&path::clean(name)) {
            node.unreadable = true;
        }
        self
    }

    fn ensure(self, name: &str) -> MemFs {
        if self.nodes.contains_key(&path::clean(name)) {
            self
        } else {
            self.dir(name, None)
        }
    }

    fn make_parents(&mut self, name: &str) {
        let nodes = Arc::make_mut(&mut self.nodes);
        let mut parent = String::new();
        let segments: Vec<&str> = path::segments(name).collect();
        for seg in segments.iter().take(segments.len().saturating_sub(1)) {
            parent.push('/');
            parent.push_str(seg);
            nodes
                .entry(parent.clone())
                .or_insert_with(|| Node::dir(None));
        }
    }

    fn info(name: &str, node: &Node) -> FileInfo {
        FileInfo::new(
            path::base(name),
            node.contents.as_ref().map_or(0, |c| c.len() as u64),
            node.modified,
            node.contents.is_none(),
        )
    }

    fn children(&self, dir: &str) -> Vec<FileInfo> {
        self.nodes
            .iter()
            .filter(|(name, _)| name.as_str() != dir && parent_of(name) == dir)
            .map(|(name, node)| MemFs::info(name, node))
            .collect()
    }
}

fn parent_of(name: &str) -> &str {
    match name.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &name[..idx],
    }
}

#[async_trait]
impl FileSystem for MemFs {
    type File = MemFile;

    async fn open(&self, name: &str) -> io::Result<MemFile> {
        let name = path::clean(name);

        let mut ancestor = String::new();
        for seg in path::segments(&name) {
            ancestor.push('/');
            ancestor.push_str(seg);
            if self.nodes.get(&ancestor).map_or(false, |node| node.denied) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "permission denied",
                ));
            }
        }

        let node = self
            .nodes
            .get(&name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file does not exist"))?;

        let info = MemFs::info(&name, node);
        let (contents, children) = match node.contents {
            Some(ref contents) => (Some(Cursor::new(contents.clone())), None),
            None if node.unreadable => (None, None),
            None => (None, Some(self.children(&name))),
        };
        Ok(MemFile {
            info,
            contents,
            children,
        })
    }
}

/// An open entry of a [`MemFs`].
#[derive(Debug)]
pub struct MemFile {
    info: FileInfo,
    contents: Option<Cursor<Bytes>>,
    children: Option<Vec<FileInfo>>,
}

#[async_trait]
impl File for MemFile {
    async fn stat(&self) -> io::Result<FileInfo> {
        Ok(self.info.clone())
    }

    async fn read_dir(&mut self) -> io::Result<Vec<FileInfo>> {
        if !self.info.is_dir() {
            return Err(super::not_a_directory());
        }
        self.children
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "directory is unreadable"))
    }
}

impl AsyncRead for MemFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.contents.as_mut() {
            Some(c) => Pin::new(c).poll_read(cx, buf),
            None => Poll::Ready(Err(super::is_a_directory())),
        }
    }
}

impl AsyncSeek for MemFile {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        match self.contents.as_mut() {
            Some(c) => Pin::new(c).start_seek(position),
            None => Err(super::is_a_directory()),
        }
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        match self.contents.as_mut() {
            Some(c) => Pin::new(c).poll_complete(cx),
            None => Poll::Ready(Err(super::is_a_directory())),
        }
    }
}
