//! Newline-delimited JSON sink
//!
//! Records are serialized by the caller and handed to a single writer task
//! over a bounded channel, so memory use does not grow with the number of
//! pages and lines are never interleaved.

use super::{OutputError, OutputResult};
use crate::extract::ExtractedDocument;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Records buffered between the workers and the writer task
pub const DEFAULT_CAPACITY: usize = 64;

/// Handle used by workers to emit records
///
/// Cheap to clone. The writer task ends once every handle is dropped.
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::Sender<String>,
}

impl OutputSink {
    /// Writes one record as a single JSON line
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The record was handed to the writer
    /// * `Err(OutputError::Closed)` - The writer failed earlier; see
    ///   [`SinkWriter::finish`] for the cause
    pub async fn emit(&self, document: &ExtractedDocument) -> OutputResult<()> {
        let mut line = serde_json::to_string(document)?;
        line.push('\n');
        self.tx.send(line).await.map_err(|_| OutputError::Closed)
    }
}

/// The writer task behind an [`OutputSink`]
#[derive(Debug)]
pub struct SinkWriter {
    handle: JoinHandle<OutputResult<u64>>,
}

impl SinkWriter {
    /// Waits for every queued record to be written
    ///
    /// All [`OutputSink`] clones must be dropped first, otherwise this waits
    /// forever.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of lines written
    /// * `Err(OutputError)` - The write failure that stopped the writer
    pub async fn finish(self) -> OutputResult<u64> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(OutputError::Write(std::io::Error::other(e))),
        }
    }
}

/// Starts a writer task over `writer`
///
/// # Arguments
///
/// * `writer` - Destination of the lines; flushed after every line
/// * `capacity` - Number of records that may wait for the writer
pub fn spawn<W>(mut writer: W, capacity: usize) -> (OutputSink, SinkWriter)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut written = 0u64;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
            written += 1;
        }
        writer.shutdown().await?;
        Ok::<_, OutputError>(written)
    });

    (OutputSink { tx }, SinkWriter { handle })
}

/// Creates (or truncates) the output file and starts its writer task
pub async fn open_file(path: &Path) -> OutputResult<(OutputSink, SinkWriter)> {
    let file = tokio::fs::File::create(path)
        .await
        .map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!("Writing records to {}", path.display());
    Ok(spawn(file, DEFAULT_CAPACITY))
}
