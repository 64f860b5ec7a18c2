use filechat_protocol::{ChunkEncoding, encode_chunk_content};

use crate::EncodeError;
use crate::plan::ChunkWindow;
use crate::source::ChunkSource;

/// Turns byte windows of a [`ChunkSource`] into chunk content strings.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    encoding: ChunkEncoding,
}

impl Encoder {
    pub fn new(encoding: ChunkEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> &ChunkEncoding {
        &self.encoding
    }

    /// Reads `window` from `source` and encodes it.
    ///
    /// This is the only step of an upload that suspends. Any read failure,
    /// including a source that returns fewer bytes than the window asks
    /// for, fails the whole encode.
    pub async fn encode(
        &self,
        source: &dyn ChunkSource,
        window: &ChunkWindow,
    ) -> Result<String, EncodeError> {
        let data = source.read_range(window.offset, window.len).await?;
        if data.len() as u64 != window.len {
            return Err(EncodeError::ShortRead {
                offset: window.offset,
                expected: window.len,
                actual: data.len() as u64,
            });
        }
        Ok(encode_chunk_content(
            &data,
            &self.encoding,
            source.mime_type(),
        ))
    }
}
