use filechat_protocol::ChunkEncoding;
use filechat_transfer::ChunkSizePolicy;

/// Settings for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, Default)]
pub struct UploaderConfig {
    pub policy: ChunkSizePolicy,
    pub encoding: ChunkEncoding,
    /// Adds the synthetic `fileId` to every chunk event so receivers can
    /// tell same-named files apart.
    pub tag_file_ids: bool,
}
