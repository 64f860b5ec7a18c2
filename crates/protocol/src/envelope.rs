use serde::{Deserialize, Serialize};

use crate::messages::{ChunkEvent, CompletionEvent};

/// Anything the sender puts on the outbound channel.
///
/// The wire format carries no explicit tag: receivers tell the two kinds
/// apart by their fields, so the enum is untagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    Chunk(ChunkEvent),
    Complete(CompletionEvent),
}

impl OutboundEvent {
    /// Returns the chunk payload if this is a chunk event.
    pub fn as_chunk(&self) -> Option<&ChunkEvent> {
        match self {
            OutboundEvent::Chunk(c) => Some(c),
            OutboundEvent::Complete(_) => None,
        }
    }

    /// Returns `true` for the batch completion event.
    pub fn is_completion(&self) -> bool {
        matches!(self, OutboundEvent::Complete(_))
    }
}

impl From<ChunkEvent> for OutboundEvent {
    fn from(ev: ChunkEvent) -> Self {
        OutboundEvent::Chunk(ev)
    }
}

impl From<CompletionEvent> for OutboundEvent {
    fn from(ev: CompletionEvent) -> Self {
        OutboundEvent::Complete(ev)
    }
}
