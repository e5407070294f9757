//! Resource handles over cached artifacts.
//!
//! A [`Resource`] is what a [`Repository`](crate::Repository) hands back
//! for a coordinate: either the file is already on disk (*complete*) or a
//! background transfer is producing it (*incomplete*). Both expose the
//! same three operations: open a reader, await on-disk completion, and
//! get the destination path.

use crate::error::{FetchError, Result};
use crate::transfer::{PartialReader, TransferCell};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Handle to a cached (or in-flight) artifact. Cheap to clone; clones
/// share the same underlying transfer.
#[derive(Debug, Clone)]
pub struct Resource {
    inner: Inner,
}

#[derive(Debug, Clone)]
enum Inner {
    /// Final file already materialized on disk.
    Complete { path: PathBuf },
    /// Being produced by a background transfer.
    Incomplete { cell: Arc<TransferCell> },
}

impl Resource {
    pub(crate) fn complete(path: PathBuf) -> Self {
        Self {
            inner: Inner::Complete { path },
        }
    }

    pub(crate) fn incomplete(cell: Arc<TransferCell>) -> Self {
        Self {
            inner: Inner::Incomplete { cell },
        }
    }

    /// The destination path this resource materializes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match &self.inner {
            Inner::Complete { path } => path,
            Inner::Incomplete { cell } => cell.path(),
        }
    }

    /// Whether the resource was already on disk when resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.inner, Inner::Complete { .. })
    }

    /// The completion future: resolves to the destination path once the
    /// artifact is fully on disk, or to the terminal transfer error.
    /// Pre-resolved for a complete resource.
    ///
    /// # Errors
    /// Replays the transfer's terminal error.
    pub async fn wait(&self) -> Result<PathBuf> {
        match &self.inner {
            Inner::Complete { path } => Ok(path.clone()),
            Inner::Incomplete { cell } => cell.wait().await,
        }
    }

    /// Open an independent reader at offset zero.
    ///
    /// On an in-flight resource this is a partial reader that consumes
    /// bytes as the writer publishes them; each call gets its own cursor.
    ///
    /// # Errors
    /// Replays the terminal error of a failed transfer, or fails on I/O.
    pub fn open(&self) -> Result<ResourceReader> {
        match &self.inner {
            Inner::Complete { path } => {
                let file = std::fs::File::open(path).map_err(|e| FetchError::io(path, &e))?;
                Ok(ResourceReader::final_file(File::from_std(file), path.clone()))
            }
            Inner::Incomplete { cell } => cell.open_reader(),
        }
    }
}

/// Byte-stream reader over a resource.
#[derive(Debug)]
pub struct ResourceReader {
    kind: ReaderKind,
}

#[derive(Debug)]
enum ReaderKind {
    /// Plain read over the final file.
    Final { file: File, path: PathBuf },
    /// Availability-bounded read over a growing temporary file.
    Partial(PartialReader),
}

impl ResourceReader {
    pub(crate) fn final_file(file: File, path: PathBuf) -> Self {
        Self {
            kind: ReaderKind::Final { file, path },
        }
    }

    pub(crate) fn partial(reader: PartialReader) -> Self {
        Self {
            kind: ReaderKind::Partial(reader),
        }
    }

    /// Read into `buf`, returning the number of bytes read; `Ok(0)` is
    /// end-of-stream. On an in-flight resource this waits for the writer
    /// to publish bytes or reach a terminal state.
    ///
    /// # Errors
    /// Replays the transfer's terminal error; fails on I/O.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match &mut self.kind {
            ReaderKind::Final { file, path } => file
                .read(buf)
                .await
                .map_err(|e| FetchError::io(path.as_path(), &e)),
            ReaderKind::Partial(reader) => reader.read(buf).await,
        }
    }

    /// Skip `length` bytes forward under the same availability discipline
    /// as [`read`](Self::read).
    ///
    /// # Errors
    /// Fails with [`FetchError::UnexpectedEof`] if the stream ends first.
    pub async fn skip(&mut self, length: u64) -> Result<()> {
        match &mut self.kind {
            ReaderKind::Final { file, path } => {
                let step = i64::try_from(length).unwrap_or(i64::MAX);
                let position = file
                    .seek(SeekFrom::Current(step))
                    .await
                    .map_err(|e| FetchError::io(path.as_path(), &e))?;
                let len = file
                    .metadata()
                    .await
                    .map_err(|e| FetchError::io(path.as_path(), &e))?
                    .len();
                if position > len {
                    return Err(FetchError::UnexpectedEof { path: path.clone() });
                }
                Ok(())
            }
            ReaderKind::Partial(reader) => reader.skip(length).await,
        }
    }

    /// Read the whole remaining stream into `out`, returning the number of
    /// bytes appended.
    ///
    /// # Errors
    /// Same failure modes as [`read`](Self::read).
    pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut buf = vec![0u8; 64 * 1024];
        let mut total = 0;
        loop {
            let read = self.read(&mut buf).await?;
            if read == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&buf[..read]);
            total += read;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn complete_resource_is_preresolved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tool-1.0.jar");
        std::fs::write(&path, b"artifact bytes").unwrap();

        let resource = Resource::complete(path.clone());
        assert!(resource.is_complete());
        assert_eq!(resource.path(), path);
        assert_eq!(resource.wait().await.unwrap(), path);
    }

    #[tokio::test]
    async fn complete_resource_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tool-1.0.jar");
        std::fs::write(&path, b"artifact bytes").unwrap();

        let resource = Resource::complete(path);
        let mut reader = resource.open().unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"artifact bytes");
    }

    #[tokio::test]
    async fn complete_resource_skip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tool-1.0.jar");
        std::fs::write(&path, b"skip-me-keep").unwrap();

        let resource = Resource::complete(path);
        let mut reader = resource.open().unwrap();
        reader.skip(8).await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"keep");

        let mut reader = resource.open().unwrap();
        assert!(matches!(
            reader.skip(100).await,
            Err(FetchError::UnexpectedEof { .. })
        ));
    }

    #[tokio::test]
    async fn open_missing_complete_file_fails() {
        let temp = TempDir::new().unwrap();
        let resource = Resource::complete(temp.path().join("absent.jar"));
        assert!(matches!(resource.open(), Err(FetchError::Io { .. })));
    }
}
