//! Per-file upload state machine.
//!
//! `Pending → Uploading → Completed`, with `Failed` when a chunk cannot be
//! read, encoded or handed to the transport, and `Cancelled` when either
//! the file's own token or the batch abort token fires between chunks.

use filechat_protocol::{ChunkEvent, FileId, UploadStatus};
use filechat_transfer::{
    ChunkPlan, ChunkSource, Encoder, ProgressTracker, ProgressUpdate, TransferError, total_chunks,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::transport::Transport;
use crate::types::TaskOutcome;

/// Everything a task shares with its siblings in a batch.
pub struct TaskContext<'a> {
    pub transport: &'a dyn Transport,
    pub encoder: &'a Encoder,
    pub progress: &'a ProgressTracker,
    pub tag_file_ids: bool,
    /// Fired by the dispatcher when a sibling task fails.
    pub abort: CancellationToken,
}

/// Streams one file as a sequence of chunk events.
pub struct UploadTask<'s> {
    id: FileId,
    source: &'s dyn ChunkSource,
    cancel: CancellationToken,
    chunk_size: u64,
    total_chunks: u64,
    uploaded_chunks: u64,
    state: UploadStatus,
}

impl<'s> UploadTask<'s> {
    /// Creates a pending task. `cancel` stops this file only.
    pub fn new(id: FileId, source: &'s dyn ChunkSource, cancel: CancellationToken) -> Self {
        Self {
            id,
            source,
            cancel,
            chunk_size: 0,
            total_chunks: 0,
            uploaded_chunks: 0,
            state: UploadStatus::Pending,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    pub fn state(&self) -> UploadStatus {
        self.state
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    pub fn uploaded_chunks(&self) -> u64 {
        self.uploaded_chunks
    }

    /// `Pending → Uploading`: fixes the chunk size for the rest of the run.
    pub fn start(&mut self, chunk_size: u64) -> Result<(), UploadError> {
        if self.state != UploadStatus::Pending {
            return Err(TransferError::Configuration(format!(
                "task for {} already started",
                self.name()
            ))
            .into());
        }
        if chunk_size == 0 {
            return Err(TransferError::Configuration(
                "chunk size must be greater than zero".into(),
            )
            .into());
        }
        self.chunk_size = chunk_size;
        self.total_chunks = total_chunks(self.size(), chunk_size);
        self.uploaded_chunks = 0;
        self.state = UploadStatus::Uploading;
        Ok(())
    }

    /// Starts the task and streams every chunk through `ctx.transport`.
    ///
    /// Chunk emission and progress publication are synchronous; the task
    /// only yields while a chunk is being read and encoded. Cancellation is
    /// checked before each read and again before each emit, so a fired
    /// token never lets another event out.
    pub async fn run(
        &mut self,
        chunk_size: u64,
        ctx: &TaskContext<'_>,
    ) -> Result<TaskOutcome, UploadError> {
        self.start(chunk_size)?;
        ctx.progress.apply(ProgressUpdate::Started {
            id: self.id,
            chunk_size: self.chunk_size,
            total_chunks: self.total_chunks,
        });
        debug!(
            file = %self.name(),
            size = self.size(),
            chunk_size = self.chunk_size,
            total_chunks = self.total_chunks,
            "upload started"
        );

        for window in ChunkPlan::new(self.size(), self.chunk_size)? {
            if self.should_stop(ctx) {
                return Ok(self.cancelled(ctx));
            }

            let content = match ctx.encoder.encode(self.source, &window).await {
                Ok(c) => c,
                Err(e) => return Err(self.fail(ctx, e.into())),
            };

            if self.should_stop(ctx) {
                return Ok(self.cancelled(ctx));
            }

            debug_assert_eq!(window.index, self.uploaded_chunks);
            let event = ChunkEvent {
                chunk_content: content,
                chunk_index: window.index,
                file_name: self.name().to_string(),
                is_last_chunk: window.is_last,
                file_id: ctx.tag_file_ids.then_some(self.id),
            };
            if let Err(e) = ctx.transport.send(event.into()) {
                return Err(self.fail(ctx, e));
            }

            self.uploaded_chunks += 1;
            ctx.progress.apply(ProgressUpdate::ChunkSent {
                id: self.id,
                uploaded_chunks: self.uploaded_chunks,
            });
        }

        self.state = UploadStatus::Completed;
        ctx.progress.apply(ProgressUpdate::Completed { id: self.id });
        info!(
            file = %self.name(),
            chunks = self.uploaded_chunks,
            "upload completed"
        );
        Ok(TaskOutcome::Completed {
            chunks: self.uploaded_chunks,
        })
    }

    fn should_stop(&self, ctx: &TaskContext<'_>) -> bool {
        self.cancel.is_cancelled() || ctx.abort.is_cancelled()
    }

    fn cancelled(&mut self, ctx: &TaskContext<'_>) -> TaskOutcome {
        self.state = UploadStatus::Cancelled;
        ctx.progress.apply(ProgressUpdate::Cancelled { id: self.id });
        debug!(
            file = %self.name(),
            sent = self.uploaded_chunks,
            total = self.total_chunks,
            "upload cancelled"
        );
        TaskOutcome::Cancelled {
            chunks: self.uploaded_chunks,
        }
    }

    fn fail(&mut self, ctx: &TaskContext<'_>, err: UploadError) -> UploadError {
        self.state = UploadStatus::Failed;
        ctx.progress.apply(ProgressUpdate::Failed {
            id: self.id,
            error: err.to_string(),
        });
        warn!(
            file = %self.name(),
            chunk_index = self.uploaded_chunks,
            error = %err,
            "upload failed"
        );
        err
    }
}
