//! The download engine behind incomplete resources.
//!
//! One background task streams the HTTP response body into a temporary
//! file next to the destination. A shared progress counter, guarded by a
//! mutex and broadcast over a watch channel, lets arbitrarily many
//! concurrent readers consume the file while it grows. On success the
//! temporary file is atomically renamed to the destination; on failure the
//! error is recorded once and replayed to every reader and waiter.

use crate::client::HttpClient;
use crate::error::{FetchError, Result};
use crate::resource::ResourceReader;
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::{Semaphore, watch};
use tracing::{info, trace, warn};
use url::Url;

/// Suffix of the sibling file an in-flight transfer writes into.
const TMP_SUFFIX: &str = ".tmp";

/// Writer progress shared between the transfer task and its readers.
///
/// `received` only moves after the corresponding bytes are flushed to the
/// temporary file. `completed` is terminal for success and failure alike;
/// `error` distinguishes the two.
#[derive(Debug, Default)]
struct TransferState {
    received: u64,
    completed: bool,
    error: Option<FetchError>,
}

/// Shared state of one in-flight (or finished) transfer.
///
/// Cloning the owning [`Resource`](crate::Resource) clones an `Arc` of
/// this cell, so every handle for one destination path observes the same
/// transfer.
#[derive(Debug)]
pub(crate) struct TransferCell {
    path: PathBuf,
    tmp_path: PathBuf,
    state: Mutex<TransferState>,
    progress: watch::Sender<()>,
}

impl TransferCell {
    fn new(path: PathBuf) -> Arc<Self> {
        let (progress, _) = watch::channel(());
        Arc::new(Self {
            tmp_path: tmp_path_of(&path),
            path,
            state: Mutex::new(TransferState::default()),
            progress,
        })
    }

    /// Create the cell and open its temporary file.
    ///
    /// Opening happens here, before the transfer task exists; a failure to
    /// open transitions the cell straight to its failed terminal state and
    /// yields no job. The returned job is activated by the caller only
    /// after the cell has been published.
    pub(crate) fn prepare(
        client: HttpClient,
        url: Url,
        path: PathBuf,
        permits: Arc<Semaphore>,
    ) -> (Arc<Self>, Option<TransferJob>) {
        let cell = Self::new(path);
        match cell.open_tmp() {
            Ok(file) => {
                let job = TransferJob {
                    cell: Arc::clone(&cell),
                    client,
                    url,
                    permits,
                    file,
                };
                (cell, Some(job))
            }
            Err(error) => {
                warn!(path = %cell.tmp_path.display(), error = %error, "failed to open temporary file");
                cell.fail(error);
                (cell, None)
            }
        }
    }

    fn open_tmp(&self) -> Result<File> {
        if let Some(parent) = self.tmp_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, &e))?;
        }
        let file =
            std::fs::File::create(&self.tmp_path).map_err(|e| FetchError::io(&self.tmp_path, &e))?;
        Ok(File::from_std(file))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Publish writer progress: `bytes` more are on disk.
    fn advance(&self, bytes: u64) {
        {
            let mut state = self.state.lock();
            state.received += bytes;
        }
        self.progress.send_replace(());
    }

    /// Terminal success: rename the temporary file onto the destination.
    ///
    /// The rename happens under the state lock so a reader opening the
    /// temporary file cannot race the move.
    fn finish(&self) -> Result<()> {
        let mut state = self.state.lock();
        std::fs::rename(&self.tmp_path, &self.path).map_err(|e| FetchError::io(&self.path, &e))?;
        state.completed = true;
        drop(state);
        self.progress.send_replace(());
        Ok(())
    }

    /// Terminal failure: record the error and remove the temporary file.
    ///
    /// Removal failures are logged next to the primary error, never
    /// escalated.
    fn fail(&self, error: FetchError) {
        let mut state = self.state.lock();
        if state.completed {
            return;
        }
        if let Err(cleanup) = std::fs::remove_file(&self.tmp_path) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %self.tmp_path.display(),
                    error = %error,
                    cleanup = %cleanup,
                    "failed to remove temporary file after transfer failure"
                );
            }
        }
        state.error = Some(error);
        state.completed = true;
        drop(state);
        self.progress.send_replace(());
    }

    /// Resolve once the transfer reaches a terminal state.
    pub(crate) async fn wait(&self) -> Result<PathBuf> {
        let mut progress = self.progress.subscribe();
        loop {
            {
                let state = self.state.lock();
                if let Some(error) = &state.error {
                    return Err(error.clone());
                }
                if state.completed {
                    return Ok(self.path.clone());
                }
            }
            if progress.changed().await.is_err() {
                return Err(FetchError::Io {
                    path: self.path.clone(),
                    message: "transfer abandoned".into(),
                });
            }
        }
    }

    /// Open an independent cursor over this transfer.
    ///
    /// Already failed: the recorded error. Already completed: a plain read
    /// over the destination. Otherwise a partial reader over the growing
    /// temporary file, opened under the state lock so completion cannot
    /// rename it away first.
    pub(crate) fn open_reader(self: &Arc<Self>) -> Result<ResourceReader> {
        let progress = self.progress.subscribe();
        let state = self.state.lock();
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        if state.completed {
            drop(state);
            let file = std::fs::File::open(&self.path).map_err(|e| FetchError::io(&self.path, &e))?;
            return Ok(ResourceReader::final_file(File::from_std(file), self.path.clone()));
        }
        let file =
            std::fs::File::open(&self.tmp_path).map_err(|e| FetchError::io(&self.tmp_path, &e))?;
        drop(state);
        Ok(ResourceReader::partial(PartialReader {
            cell: Arc::clone(self),
            file: File::from_std(file),
            progress,
            read_len: 0,
        }))
    }
}

fn tmp_path_of(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| std::ffi::OsString::from("download"), ToOwned::to_owned);
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

/// The background work of one transfer: queue on a transfer slot, stream
/// the body, drive the cell to its terminal state.
#[derive(Debug)]
pub(crate) struct TransferJob {
    cell: Arc<TransferCell>,
    client: HttpClient,
    url: Url,
    permits: Arc<Semaphore>,
    file: File,
}

impl TransferJob {
    pub(crate) async fn run(self) {
        let Self {
            cell,
            client,
            url,
            permits,
            mut file,
        } = self;

        // Queue behind the fixed number of transfer slots.
        let Ok(_permit) = permits.acquire_owned().await else {
            return;
        };

        info!(url = %url, "transfer started");
        let start = Instant::now();

        let outcome = Self::transfer(&cell, &client, &url, &mut file).await;
        drop(file);

        match outcome.and_then(|received| cell.finish().map(|()| received)) {
            Ok(received) => {
                info!(
                    url = %url,
                    bytes = received,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "transfer completed"
                );
            }
            Err(error) => {
                warn!(url = %url, error = %error, "transfer failed");
                cell.fail(error);
            }
        }
    }

    async fn transfer(
        cell: &TransferCell,
        client: &HttpClient,
        url: &Url,
        file: &mut File,
    ) -> Result<u64> {
        let response = client.get(url).await?;
        let mut stream = response.bytes_stream();
        let mut received = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(url, &e))?;
            if chunk.is_empty() {
                continue;
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(&cell.tmp_path, &e))?;
            // The chunk must be on disk before the counter moves; readers
            // trust the counter over the file.
            file.flush()
                .await
                .map_err(|e| FetchError::io(&cell.tmp_path, &e))?;
            received += chunk.len() as u64;
            cell.advance(chunk.len() as u64);
            trace!(url = %url, bytes = received, "transfer progress");
        }

        Ok(received)
    }
}

/// A read cursor over a file that is still being written.
///
/// Each read first awaits `received - read_len > 0` (or a terminal state)
/// and never requests more from the file than the published counter
/// allows, so it cannot race ahead of the writer.
#[derive(Debug)]
pub(crate) struct PartialReader {
    cell: Arc<TransferCell>,
    file: File,
    progress: watch::Receiver<()>,
    read_len: u64,
}

impl PartialReader {
    /// Await unread bytes. `Ok(None)` means completed and fully drained.
    async fn await_available(&mut self) -> Result<Option<u64>> {
        loop {
            {
                let state = self.cell.state.lock();
                if let Some(error) = &state.error {
                    return Err(error.clone());
                }
                let available = state.received - self.read_len;
                if available > 0 {
                    return Ok(Some(available));
                }
                if state.completed {
                    return Ok(None);
                }
            }
            if self.progress.changed().await.is_err() {
                return Err(FetchError::Io {
                    path: self.cell.path.clone(),
                    message: "transfer abandoned".into(),
                });
            }
        }
    }

    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(available) = self.await_available().await? else {
            return Ok(0);
        };
        let want = buf.len().min(usize::try_from(available).unwrap_or(usize::MAX));
        let read = self
            .file
            .read(&mut buf[..want])
            .await
            .map_err(|e| FetchError::io(&self.cell.tmp_path, &e))?;
        if read == 0 {
            // The writer published more bytes than the file holds.
            return Err(FetchError::PrematureEof {
                path: self.cell.tmp_path.clone(),
            });
        }
        self.read_len += read as u64;
        Ok(read)
    }

    pub(crate) async fn skip(&mut self, length: u64) -> Result<()> {
        let mut remaining = length;
        while remaining > 0 {
            let Some(available) = self.await_available().await? else {
                return Err(FetchError::UnexpectedEof {
                    path: self.cell.tmp_path.clone(),
                });
            };
            let step = remaining.min(available);
            self.file
                .seek(SeekFrom::Current(step as i64))
                .await
                .map_err(|e| FetchError::io(&self.cell.tmp_path, &e))?;
            self.read_len += step;
            remaining -= step;
        }
        Ok(())
    }
}
