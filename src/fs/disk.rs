//! A [`FileSystem`] backed by a directory on the local disk.

use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::fs::File as TkFile;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use super::{File, FileInfo, FileSystem};

/// A directory on the local disk.
///
/// Request paths are resolved below `root`; a path can never name anything
/// outside of it, since it has been cleaned before reaching here.
#[derive(Clone, Debug)]
pub struct Dir {
    root: PathBuf,
}

impl Dir {
    /// Serve the tree below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Dir {
        Dir { root: root.into() }
    }

    /// The directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let mut buf = self.root.clone();
        for seg in crate::path::segments(name) {
            if cfg!(windows) && (seg.contains('\\') || seg.contains(':')) {
                tracing::warn!("dir: rejecting segment {:?}", seg);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "invalid character in file path",
                ));
            }
            buf.push(seg);
        }
        Ok(buf)
    }
}

#[async_trait]
impl FileSystem for Dir {
    type File = DiskFile;

    async fn open(&self, name: &str) -> io::Result<DiskFile> {
        let path = self.resolve(name)?;
        tracing::trace!("dir: open {:?} -> {:?}", name, path);

        let meta = tokio::fs::metadata(&path).await?;
        let file = if meta.is_dir() {
            // an unreadable directory fails here, not later when listing
            tokio::fs::read_dir(&path).await?;
            None
        } else {
            Some(TkFile::open(&path).await?)
        };
        let info = info_from(display_name(&path), &meta);
        Ok(DiskFile { path, info, file })
    }
}

/// An open entry of a [`Dir`].
#[derive(Debug)]
pub struct DiskFile {
    path: PathBuf,
    info: FileInfo,
    // `None` for directories.
    file: Option<TkFile>,
}

#[async_trait]
impl File for DiskFile {
    async fn stat(&self) -> io::Result<FileInfo> {
        Ok(self.info.clone())
    }

    async fn read_dir(&mut self) -> io::Result<Vec<FileInfo>> {
        if self.file.is_some() {
            return Err(super::not_a_directory());
        }
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        let mut infos = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // follow symlinks, but still list dangling ones
            let meta = match tokio::fs::metadata(entry.path()).await {
                Ok(meta) => meta,
                Err(_) => entry.metadata().await?,
            };
            infos.push(info_from(name, &meta));
        }
        Ok(infos)
    }
}

impl AsyncRead for DiskFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.file.as_mut() {
            Some(f) => Pin::new(f).poll_read(cx, buf),
            None => Poll::Ready(Err(super::is_a_directory())),
        }
    }
}

impl AsyncSeek for DiskFile {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => Pin::new(f).start_seek(position),
            None => Err(super::is_a_directory()),
        }
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        match self.file.as_mut() {
            Some(f) => Pin::new(f).poll_complete(cx),
            None => Poll::Ready(Err(super::is_a_directory())),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_owned())
}

fn info_from(name: String, meta: &Metadata) -> FileInfo {
    FileInfo::new(name, meta.len(), meta.modified().ok(), meta.is_dir())
}
