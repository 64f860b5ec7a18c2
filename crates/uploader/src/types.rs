//! Result types for tasks and batches.

/// How a single upload task ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Every chunk was emitted.
    Completed { chunks: u64 },
    /// Stopped between chunks after `chunks` had been emitted.
    Cancelled { chunks: u64 },
}

/// What a finished batch sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub files_completed: usize,
    pub files_cancelled: usize,
    pub chunks_sent: u64,
    /// The message carried by the completion event.
    pub message: String,
}

/// Result of [`Dispatcher::submit`](crate::Dispatcher::submit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No files and no message: nothing was sent and nothing was reset.
    Empty,
    /// All files streamed and the completion event was sent.
    Sent(BatchSummary),
}
