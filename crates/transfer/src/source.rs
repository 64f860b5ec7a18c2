use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use filechat_protocol::constants::DEFAULT_MIME_TYPE;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

use crate::{EncodeError, TransferError};

/// Future returned by [`ChunkSource::read_range`].
pub type ReadFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, EncodeError>> + Send + 'a>>;

/// Random-access byte source for one selected file.
///
/// Sources are read window by window; a read either returns exactly the
/// requested bytes or fails. The size is captured when the source is
/// created and never changes afterwards, even if the underlying file does.
pub trait ChunkSource: Send + Sync {
    /// Name sent on the wire as `fileName`.
    fn name(&self) -> &str;

    /// Total length in bytes.
    fn size(&self) -> u64;

    /// MIME type used when framing chunks as data URLs.
    fn mime_type(&self) -> &str {
        DEFAULT_MIME_TYPE
    }

    /// Reads `len` bytes starting at `offset`.
    fn read_range(&self, offset: u64, len: u64) -> ReadFuture<'_>;
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// A file on the local filesystem.
pub struct FileSource {
    path: PathBuf,
    name: String,
    size: u64,
    mime: String,
    file: Mutex<tokio::fs::File>,
}

impl FileSource {
    /// Opens `path` and records its current size.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(TransferError::InvalidName(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TransferError::InvalidName(path.display().to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            mime: guess_mime_type(&name).to_string(),
            name,
            size: meta.len(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Uses `mime` instead of `application/octet-stream` when the extension
    /// is not recognised.
    pub fn with_fallback_mime(mut self, mime: &str) -> Self {
        if self.mime == DEFAULT_MIME_TYPE {
            self.mime = mime.to_string();
        }
        self
    }
}

impl ChunkSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        &self.mime
    }

    fn read_range(&self, offset: u64, len: u64) -> ReadFuture<'_> {
        Box::pin(async move {
            check_range(offset, len, self.size)?;
            let read_err = |source| EncodeError::Read { offset, source };

            let mut file = self.file.lock().await;
            file.seek(std::io::SeekFrom::Start(offset))
                .await
                .map_err(read_err)?;

            // The file may have shrunk since it was opened; a short read is
            // an error rather than a truncated chunk.
            let mut buf = vec![0u8; len as usize];
            let mut filled = 0;
            while filled < buf.len() {
                let n = file.read(&mut buf[filled..]).await.map_err(read_err)?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled < buf.len() {
                return Err(EncodeError::ShortRead {
                    offset,
                    expected: len,
                    actual: filled as u64,
                });
            }
            Ok(buf)
        })
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// An in-memory buffer, e.g. a pasted image or a test fixture.
#[derive(Clone)]
pub struct MemorySource {
    name: String,
    mime: String,
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        Self {
            mime: guess_mime_type(&name).to_string(),
            name,
            data: data.into(),
        }
    }

    /// Overrides the guessed MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }
}

impl ChunkSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.mime
    }

    fn read_range(&self, offset: u64, len: u64) -> ReadFuture<'_> {
        Box::pin(async move {
            check_range(offset, len, self.size())?;
            let start = offset as usize;
            Ok(self.data[start..start + len as usize].to_vec())
        })
    }
}

fn check_range(offset: u64, len: u64, size: u64) -> Result<(), EncodeError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(EncodeError::OutOfRange { offset, len, size }),
    }
}

/// Guesses a MIME type from a file name's extension.
///
/// Covers what people usually attach to a chat; anything else is sent as
/// `application/octet-stream`.
pub fn guess_mime_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        Some("csv") => "text/csv",
        Some("txt" | "log" | "md") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        _ => DEFAULT_MIME_TYPE,
    }
}
