//! `send` and `receive` commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use filechat_protocol::OutboundEvent;
use filechat_transfer::{AssembleOutcome, ChunkSource, FileAssembler, FileSource};
use filechat_uploader::{BatchOutcome, Dispatcher, JsonLinesTransport};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::cli::Command;
use crate::config::Config;

pub async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Send { message, files } => {
            let outcome = send(&config, message, &files, std::io::stdout()).await?;
            if let BatchOutcome::Sent(summary) = outcome {
                tracing::info!(
                    files = summary.files_completed,
                    chunks = summary.chunks_sent,
                    "upload finished"
                );
            } else {
                tracing::info!("nothing to send");
            }
            Ok(())
        }
        Command::Receive { out } => {
            let stdin = BufReader::new(tokio::io::stdin());
            let report = receive(&out, stdin).await?;
            let mut stdout = std::io::stdout().lock();
            for message in &report.messages {
                writeln!(stdout, "{message}")?;
            }
            Ok(())
        }
    }
}

/// Uploads `paths` and `message` as one batch, writing events to `writer`.
///
/// Ctrl-C cancels the batch; chunks already written stay written.
pub async fn send<W>(
    config: &Config,
    message: String,
    paths: &[PathBuf],
    writer: W,
) -> anyhow::Result<BatchOutcome>
where
    W: Write + Send + 'static,
{
    let mut sources: Vec<Box<dyn ChunkSource>> = Vec::with_capacity(paths.len());
    for path in paths {
        let source = FileSource::open(path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?
            .with_fallback_mime(&config.default_mime);
        tracing::debug!(file = %source.name(), size = source.size(), "file selected");
        sources.push(Box::new(source));
    }

    let transport = Arc::new(JsonLinesTransport::new(writer));
    let mut dispatcher = Dispatcher::new(config.uploader_config()?, transport);
    dispatcher.add_sources(sources);
    dispatcher.set_message(message);

    let cancel = dispatcher.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling upload");
            cancel.cancel();
        }
    });

    let outcome = dispatcher.submit().await;
    interrupt.abort();
    Ok(outcome?)
}

/// What a `receive` run produced.
#[derive(Debug, Default)]
pub struct ReceiveReport {
    pub files: Vec<PathBuf>,
    pub messages: Vec<String>,
    /// Files whose last chunk never arrived.
    pub discarded: usize,
}

/// Reassembles files from JSON-line events read from `input`.
pub async fn receive<R>(out: &Path, input: R) -> anyhow::Result<ReceiveReport>
where
    R: AsyncBufRead + Unpin,
{
    std::fs::create_dir_all(out)
        .with_context(|| format!("cannot create {}", out.display()))?;

    let mut assembler = FileAssembler::new(out);
    let mut report = ReceiveReport::default();
    let mut lines = input.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: OutboundEvent = serde_json::from_str(&line)
            .with_context(|| format!("invalid event on line {line_no}"))?;

        match event {
            OutboundEvent::Chunk(chunk) => {
                let outcome = assembler
                    .accept(&chunk)
                    .with_context(|| format!("rejected chunk on line {line_no}"))?;
                if let AssembleOutcome::Completed(path) = outcome {
                    tracing::info!(path = %path.display(), "file received");
                    report.files.push(path);
                }
            }
            OutboundEvent::Complete(done) => {
                tracing::info!(files = report.files.len(), "batch complete");
                report.messages.push(done.message);
            }
        }
    }

    let incomplete = assembler.incomplete();
    if !incomplete.is_empty() {
        tracing::warn!(files = ?incomplete, "stream ended with incomplete files");
    }
    report.discarded = assembler.discard_incomplete();
    Ok(report)
}
