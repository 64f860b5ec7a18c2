//! Batch dispatcher: one upload task per selected file, one completion
//! event per batch.
//!
//! All tasks of a batch are polled from a single future, so they run
//! concurrently but never in parallel: they interleave only while a chunk
//! is being read. When a task fails, its siblings are told to stop at
//! their next chunk boundary and the dispatcher waits for them to settle
//! before reporting the failure.

use std::collections::HashSet;
use std::sync::Arc;

use filechat_protocol::{CompletionEvent, FileId, FileProgress, UploadStatus};
use filechat_transfer::{
    BatchSnapshot, ChunkSource, Encoder, ProgressTracker, ProgressUpdate, total_chunks,
};
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::task::{TaskContext, UploadTask};
use crate::transport::Transport;
use crate::types::{BatchOutcome, BatchSummary, TaskOutcome};

struct SelectedFile {
    id: FileId,
    source: Box<dyn ChunkSource>,
    cancel: CancellationToken,
}

/// Owns the current selection and message, and uploads them as a batch.
pub struct Dispatcher {
    config: UploaderConfig,
    transport: Arc<dyn Transport>,
    encoder: Encoder,
    progress: ProgressTracker,
    files: Vec<SelectedFile>,
    message: String,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty selection.
    pub fn new(config: UploaderConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            encoder: Encoder::new(config.encoding.clone()),
            config,
            transport,
            progress: ProgressTracker::new(),
            files: Vec::new(),
            message: String::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Adds one file to the selection and returns its id.
    pub fn add_file(&mut self, source: impl ChunkSource + 'static) -> FileId {
        self.add_sources(vec![Box::new(source) as Box<dyn ChunkSource>])[0]
    }

    /// Adds several files at once, keeping their order.
    pub fn add_sources(&mut self, sources: Vec<Box<dyn ChunkSource>>) -> Vec<FileId> {
        let estimate = self.config.policy.base();
        let mut ids = Vec::with_capacity(sources.len());
        let mut entries = Vec::with_capacity(sources.len());
        for source in sources {
            let id = FileId::new();
            entries.push(pending_progress(id, source.as_ref(), estimate));
            self.files.push(SelectedFile {
                id,
                source,
                cancel: self.cancel.child_token(),
            });
            ids.push(id);
        }
        self.progress.apply(ProgressUpdate::Selected(entries));
        ids
    }

    /// Drops a file from the selection and cancels any upload of it.
    ///
    /// Returns `false` if the id is not selected.
    pub fn remove_file(&mut self, id: FileId) -> bool {
        let Some(pos) = self.files.iter().position(|f| f.id == id) else {
            return false;
        };
        let file = self.files.remove(pos);
        file.cancel.cancel();
        self.progress.apply(ProgressUpdate::Removed(id));
        debug!(file = %file.source.name(), "file removed from selection");
        true
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Ids of the selected files, in selection order.
    pub fn file_ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.id).collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// `true` when there is neither a file nor a message to send.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.message.is_empty()
    }

    /// Latest progress snapshot.
    pub fn snapshot(&self) -> BatchSnapshot {
        self.progress.snapshot()
    }

    /// Subscribes to progress snapshots.
    pub fn subscribe(&self) -> watch::Receiver<BatchSnapshot> {
        self.progress.subscribe()
    }

    /// Token that stops every current and future upload of this dispatcher.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Token that stops the upload of one selected file.
    ///
    /// Grab it before [`submit`](Self::submit) to cancel a single file
    /// while the batch is running; the rest of the batch carries on.
    pub fn file_cancel_token(&self, id: FileId) -> Option<CancellationToken> {
        self.files
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.cancel.clone())
    }

    /// Uploads every selected file, then sends the completion event and
    /// clears the selection.
    ///
    /// The chunk size is chosen once from the number of selected files and
    /// used by every task in the batch. With nothing selected and no
    /// message this is a no-op returning [`BatchOutcome::Empty`]. On failure
    /// the selection and message are kept and no completion event is sent;
    /// files cancelled through their own token are dropped either way.
    pub async fn submit(&mut self) -> Result<BatchOutcome, UploadError> {
        if self.is_empty() {
            debug!("nothing to send");
            return Ok(BatchOutcome::Empty);
        }
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        self.warn_duplicate_names();

        let chunk_size = if self.files.is_empty() {
            0
        } else {
            self.config.policy.chunk_size(self.files.len())?
        };
        info!(
            files = self.files.len(),
            chunk_size,
            has_message = !self.message.is_empty(),
            "submitting batch"
        );

        let results = {
            let ctx = TaskContext {
                transport: self.transport.as_ref(),
                encoder: &self.encoder,
                progress: &self.progress,
                tag_file_ids: self.config.tag_file_ids,
                abort: CancellationToken::new(),
            };
            let ctx = &ctx;
            let runs = self.files.iter().map(|file| async move {
                let mut task = UploadTask::new(file.id, file.source.as_ref(), file.cancel.clone());
                let result = task.run(chunk_size, ctx).await;
                if result.is_err() {
                    ctx.abort.cancel();
                }
                result
            });
            join_all(runs).await
        };

        let mut summary = BatchSummary::default();
        let mut failure = None;
        for result in results {
            match result {
                Ok(TaskOutcome::Completed { chunks }) => {
                    summary.files_completed += 1;
                    summary.chunks_sent += chunks;
                }
                Ok(TaskOutcome::Cancelled { chunks }) => {
                    summary.files_cancelled += 1;
                    summary.chunks_sent += chunks;
                }
                Err(e) => {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        self.drop_cancelled_files();

        if let Some(e) = failure {
            error!(error = %e, "batch failed, selection kept");
            return Err(e);
        }
        if self.cancel.is_cancelled() {
            warn!("batch cancelled, selection kept");
            return Err(UploadError::Cancelled);
        }

        self.transport.send(
            CompletionEvent {
                message: self.message.clone(),
            }
            .into(),
        )?;

        summary.message = std::mem::take(&mut self.message);
        self.files.clear();
        self.progress.apply(ProgressUpdate::Cleared);

        info!(
            files = summary.files_completed,
            cancelled = summary.files_cancelled,
            chunks = summary.chunks_sent,
            "batch sent"
        );
        Ok(BatchOutcome::Sent(summary))
    }

    /// Drops files the caller cancelled individually. Files stopped by the
    /// root token stay selected.
    fn drop_cancelled_files(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.cancel.is_cancelled());
        self.files = kept;
        for file in cancelled {
            debug!(file = %file.source.name(), "cancelled file dropped from selection");
            self.progress.apply(ProgressUpdate::Removed(file.id));
        }
    }

    fn warn_duplicate_names(&self) {
        if self.config.tag_file_ids {
            return;
        }
        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file.source.name()) {
                warn!(
                    file = %file.source.name(),
                    "duplicate file name in batch; receiver cannot tell them apart"
                );
            }
        }
    }
}

/// Progress entry for a freshly selected file.
///
/// `total_chunks` is an estimate from `estimate_chunk_size` until the
/// upload starts and fixes the real chunk size.
pub(crate) fn pending_progress(
    id: FileId,
    source: &dyn ChunkSource,
    estimate_chunk_size: u64,
) -> FileProgress {
    FileProgress {
        id,
        name: source.name().to_string(),
        size: source.size(),
        chunk_size: 0,
        total_chunks: total_chunks(source.size(), estimate_chunk_size.max(1)),
        uploaded_chunks: 0,
        status: UploadStatus::Pending,
        error: String::new(),
    }
}
