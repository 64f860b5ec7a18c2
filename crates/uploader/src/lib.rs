//! Batch upload of selected files over a one-way text channel.
//!
//! This crate implements the **coordination** half of filechat. It has no
//! transport of its own: callers provide a [`Transport`] that relays
//! events to the remote consumer.
//!
//! # Pipeline
//!
//! 1. **Select**: files are added to a [`Dispatcher`] with an optional message
//! 2. **Size**: one chunk size is picked for the whole batch
//! 3. **Stream**: one [`UploadTask`] per file encodes and emits chunk events
//! 4. **Complete**: a single `{message}` event, then the batch is cleared

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod task;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience.
pub use config::UploaderConfig;
pub use dispatcher::Dispatcher;
pub use error::UploadError;
pub use task::{TaskContext, UploadTask};
pub use transport::{ChannelTransport, JsonLinesTransport, Transport};
pub use types::{BatchOutcome, BatchSummary, TaskOutcome};
