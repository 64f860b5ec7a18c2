use crate::{BASE_CHUNK_SIZE, MIN_CHUNK_SIZE, TransferError};

/// Picks the chunk size for a batch from the number of files sharing the
/// outbound channel.
///
/// `chunk_size(n) = max(base / n, min)`. More files means smaller chunks
/// so every file keeps making visible progress, down to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSizePolicy {
    base: u64,
    min: u64,
}

impl Default for ChunkSizePolicy {
    fn default() -> Self {
        Self {
            base: BASE_CHUNK_SIZE,
            min: MIN_CHUNK_SIZE,
        }
    }
}

impl ChunkSizePolicy {
    /// Creates a policy with explicit bounds. Both must be non-zero.
    pub fn new(base: u64, min: u64) -> Result<Self, TransferError> {
        if base == 0 {
            return Err(TransferError::Configuration(
                "base chunk size must be greater than zero".into(),
            ));
        }
        if min == 0 {
            return Err(TransferError::Configuration(
                "minimum chunk size must be greater than zero".into(),
            ));
        }
        Ok(Self { base, min })
    }

    /// Chunk size for a batch of `num_files` files.
    pub fn chunk_size(&self, num_files: usize) -> Result<u64, TransferError> {
        if num_files == 0 {
            return Err(TransferError::Configuration(
                "chunk size requested for zero files".into(),
            ));
        }
        Ok(std::cmp::max(self.base / num_files as u64, self.min))
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn min(&self) -> u64 {
        self.min
    }
}

/// [`ChunkSizePolicy::chunk_size`] with the default 1 MiB / 256 KiB bounds.
pub fn chunk_size(num_files: usize) -> Result<u64, TransferError> {
    ChunkSizePolicy::default().chunk_size(num_files)
}
