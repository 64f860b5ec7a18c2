//! Text codec for chunk payloads.
//!
//! The outbound channel only carries text, so every chunk is base64
//! encoded. Two framings are supported: a bare base64 string, and a data
//! URL (`data:<mime>;base64,<payload>`) which is what browser readers
//! produce and what existing receivers strip before decoding.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::constants::{DATA_URL_BASE64_MARKER, DATA_URL_SCHEME};

/// Errors produced while decoding chunk content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Text framing applied to chunk payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkEncoding {
    /// `data:<mime>;base64,<payload>`.
    #[default]
    DataUrl,
    /// Bare standard base64 with padding.
    Base64,
}

/// Encodes `data` using the given framing.
///
/// `mime` is only used by [`ChunkEncoding::DataUrl`].
pub fn encode_chunk_content(data: &[u8], encoding: &ChunkEncoding, mime: &str) -> String {
    match encoding {
        ChunkEncoding::Base64 => STANDARD.encode(data),
        ChunkEncoding::DataUrl => {
            let payload = STANDARD.encode(data);
            let mut out = String::with_capacity(
                DATA_URL_SCHEME.len() + mime.len() + DATA_URL_BASE64_MARKER.len() + payload.len(),
            );
            out.push_str(DATA_URL_SCHEME);
            out.push_str(mime);
            out.push_str(DATA_URL_BASE64_MARKER);
            out.push_str(&payload);
            out
        }
    }
}

/// Decodes chunk content produced by [`encode_chunk_content`].
///
/// Data URLs are detected by their scheme, anything else is treated as
/// bare base64. An empty data URL payload (`data:` with nothing after the
/// marker) decodes to an empty buffer.
pub fn decode_chunk_content(content: &str) -> Result<Vec<u8>, ContentError> {
    let payload = match content.strip_prefix(DATA_URL_SCHEME) {
        Some(rest) => match rest.find(DATA_URL_BASE64_MARKER) {
            Some(pos) => &rest[pos + DATA_URL_BASE64_MARKER.len()..],
            None => return Err(ContentError::MalformedDataUrl(truncate(content))),
        },
        None => content,
    };
    Ok(STANDARD.decode(payload)?)
}

fn truncate(s: &str) -> String {
    s.chars().take(48).collect()
}
