use crate::TransferError;

/// Number of chunks a file of `size` bytes is cut into.
///
/// A zero-byte file has zero chunks. `chunk_size` must be non-zero.
pub fn total_chunks(size: u64, chunk_size: u64) -> u64 {
    size.div_ceil(chunk_size)
}

/// One byte window of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    /// 0-based position of this chunk within the file.
    pub index: u64,
    /// Byte offset of the first byte.
    pub offset: u64,
    /// Length in bytes; only the last window may be shorter than the chunk size.
    pub len: u64,
    pub is_last: bool,
}

/// Walks a file in chunk-sized windows, in order.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    size: u64,
    chunk_size: u64,
    offset: u64,
}

impl ChunkPlan {
    pub fn new(size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Configuration(
                "chunk size must be greater than zero".into(),
            ));
        }
        Ok(Self {
            size,
            chunk_size,
            offset: 0,
        })
    }

    pub fn total_chunks(&self) -> u64 {
        total_chunks(self.size, self.chunk_size)
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }
}

impl Iterator for ChunkPlan {
    type Item = ChunkWindow;

    fn next(&mut self) -> Option<ChunkWindow> {
        if self.offset >= self.size {
            return None;
        }
        let offset = self.offset;
        let end = offset.saturating_add(self.chunk_size);
        let window = ChunkWindow {
            index: offset / self.chunk_size,
            offset,
            len: end.min(self.size) - offset,
            is_last: end >= self.size,
        };
        self.offset = end;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = total_chunks(self.size.saturating_sub(self.offset), self.chunk_size);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
