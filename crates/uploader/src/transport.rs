//! Outbound event sinks.
//!
//! `Transport` is implemented by whatever actually delivers messages to
//! the remote consumer. Delivery is fire-and-forget: a sink either accepts
//! an event immediately or reports that it is gone, it never blocks and
//! never acknowledges.

use std::io::Write;
use std::sync::{Arc, Mutex};

use filechat_protocol::OutboundEvent;
use tokio::sync::mpsc;

use crate::error::UploadError;

/// Sink for outbound events.
pub trait Transport: Send + Sync {
    /// Hands one event to the channel.
    fn send(&self, event: OutboundEvent) -> Result<(), UploadError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, event: OutboundEvent) -> Result<(), UploadError> {
        (**self).send(event)
    }
}

// ---------------------------------------------------------------------------
// ChannelTransport
// ---------------------------------------------------------------------------

/// Forwards events into an unbounded tokio channel.
///
/// Unbounded on purpose: the upload pipeline has no backpressure, so the
/// consumer end is expected to keep up or buffer.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelTransport {
    /// Creates the transport and the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, event: OutboundEvent) -> Result<(), UploadError> {
        self.tx
            .send(event)
            .map_err(|_| UploadError::Transport("receiver dropped".into()))
    }
}

// ---------------------------------------------------------------------------
// JsonLinesTransport
// ---------------------------------------------------------------------------

/// Writes each event as one line of JSON.
pub struct JsonLinesTransport<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Transport for JsonLinesTransport<W> {
    fn send(&self, event: OutboundEvent) -> Result<(), UploadError> {
        let line = serde_json::to_string(&event)?;
        let mut w = self
            .writer
            .lock()
            .map_err(|_| UploadError::Transport("writer lock poisoned".into()))?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}
