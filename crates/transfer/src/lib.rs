//! Chunk sizing, chunk reading and encoding, and progress tracking.
//!
//! This crate holds the transport-independent half of the pipeline:
//! how big each chunk is, which byte windows a file is cut into, how a
//! window becomes text, and how per-file progress is folded into an
//! immutable batch snapshot. The receiving side's [`FileAssembler`]
//! lives here too since it is the exact inverse of the reader.

mod assembler;
mod encode;
mod plan;
mod policy;
mod progress;
mod source;
mod validation;

pub use assembler::{AssembleOutcome, FileAssembler};
pub use encode::Encoder;
pub use plan::{ChunkPlan, ChunkWindow, total_chunks};
pub use policy::{ChunkSizePolicy, chunk_size};
pub use progress::{BatchSnapshot, ProgressTracker, ProgressUpdate, reduce};
pub use source::{ChunkSource, FileSource, MemorySource, ReadFuture, guess_mime_type};
pub use validation::validate_file_name;

/// Chunk size used when a single file is in flight: 1 MiB.
pub const BASE_CHUNK_SIZE: u64 = 1024 * 1024;

/// Lower bound for the chunk size no matter how many files share the
/// channel: 256 KiB.
pub const MIN_CHUNK_SIZE: u64 = 256 * 1024;

/// Failure to turn a byte window into chunk content.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("read failed at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error("window {offset}+{len} is outside a source of {size} bytes")]
    OutOfRange { offset: u64, len: u64, size: u64 },
}

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chunk content: {0}")]
    Content(#[from] filechat_protocol::ContentError),

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("out-of-order chunk for {file}: expected index {expected}, got {got}")]
    OutOfOrder {
        file: String,
        expected: u64,
        got: u64,
    },
}
