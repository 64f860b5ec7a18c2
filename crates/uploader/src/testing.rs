//! Shared fakes for the uploader tests.

use std::sync::Mutex;

use filechat_protocol::{ChunkEvent, FileId, FileProgress, OutboundEvent};
use filechat_transfer::{BASE_CHUNK_SIZE, ChunkSource, EncodeError, MemorySource, ReadFuture};

use crate::dispatcher::pending_progress;
use crate::error::UploadError;
use crate::transport::Transport;

type SendHook = Box<dyn Fn(&OutboundEvent) + Send + Sync>;

/// Records every event in arrival order.
#[derive(Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<OutboundEvent>>,
    closed: Mutex<bool>,
    hook: Mutex<Option<SendHook>>,
}

impl RecordingTransport {
    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Chunk events for `name`, in emission order.
    pub fn chunks_for(&self, name: &str) -> Vec<ChunkEvent> {
        self.events()
            .iter()
            .filter_map(OutboundEvent::as_chunk)
            .filter(|c| c.file_name == name)
            .cloned()
            .collect()
    }

    pub fn completions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::Complete(c) => Some(c.message),
                OutboundEvent::Chunk(_) => None,
            })
            .collect()
    }

    /// Makes every further send fail.
    pub fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }

    /// Runs `hook` after each accepted event.
    pub fn on_send(&self, hook: impl Fn(&OutboundEvent) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }
}

impl Transport for RecordingTransport {
    fn send(&self, event: OutboundEvent) -> Result<(), UploadError> {
        if *self.closed.lock().unwrap() {
            return Err(UploadError::Transport("closed".into()));
        }
        self.events.lock().unwrap().push(event.clone());
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(&event);
        }
        Ok(())
    }
}

/// Source whose reads fail from `fail_from` onwards, as if the file
/// became unreadable halfway through.
pub struct FailingSource {
    name: String,
    size: u64,
    fail_from: u64,
}

impl FailingSource {
    pub fn new(name: &str, size: u64, fail_from: u64) -> Self {
        Self {
            name: name.into(),
            size,
            fail_from,
        }
    }
}

impl ChunkSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_range(&self, offset: u64, len: u64) -> ReadFuture<'_> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            if offset >= self.fail_from {
                return Err(EncodeError::Read {
                    offset,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file vanished"),
                });
            }
            Ok(vec![0xAB; len as usize])
        })
    }
}

/// In-memory source that yields to the scheduler `yields` times before
/// every read, so concurrent tasks interleave like they would on real I/O.
pub struct YieldingSource {
    inner: MemorySource,
    yields: usize,
}

impl YieldingSource {
    pub fn new(name: &str, data: Vec<u8>, yields: usize) -> Self {
        Self {
            inner: MemorySource::new(name, data),
            yields,
        }
    }
}

impl ChunkSource for YieldingSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn read_range(&self, offset: u64, len: u64) -> ReadFuture<'_> {
        Box::pin(async move {
            for _ in 0..self.yields {
                tokio::task::yield_now().await;
            }
            self.inner.read_range(offset, len).await
        })
    }
}

pub fn progress_entry(id: FileId, source: &dyn ChunkSource) -> FileProgress {
    pending_progress(id, source, BASE_CHUNK_SIZE)
}
