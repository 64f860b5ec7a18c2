use serde::{Deserialize, Serialize};

use crate::types::FileId;

/// One encoded chunk of a file.
///
/// Field names match what existing receivers read: `chunkContent`,
/// `chunkIndex`, `fileName`, `isLastChunk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkEvent {
    pub chunk_content: String,
    pub chunk_index: u64,
    pub file_name: String,
    pub is_last_chunk: bool,
    /// Synthetic per-selection identity, only sent when id tagging is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<FileId>,
}

/// Sent exactly once after every file of a batch has been streamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub message: String,
}
