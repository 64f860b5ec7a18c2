//! Wire types shared by the filechat sender and receiver.
//!
//! Everything that crosses the outbound channel is defined here: the
//! per-chunk event, the batch completion event, the envelope that tells
//! them apart, and the text codec used for chunk payloads.

pub mod constants;
pub mod content;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use content::{ChunkEncoding, ContentError, decode_chunk_content, encode_chunk_content};
pub use envelope::OutboundEvent;
pub use messages::{ChunkEvent, CompletionEvent};
pub use types::{FileId, FileProgress, UploadStatus};
