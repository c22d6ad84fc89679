//! Bulk importer - file → chunked transactions / 批量导入
//!
//! Idle → Opening → Streaming → (Flushing)* → Closing → Completed | Interrupted | Failed
//!
//! - Each chunk is one transaction; a failed chunk is logged, counted and
//!   skipped, earlier chunks stay committed.
//! - On interruption the buffered (uncommitted) lines are discarded. Re-running
//!   the same file is safe because inserts are deduplicated by fingerprint.

use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::state::{ImportPhase, ImportState};
use crate::error::{LogError, Result};
use crate::search::{BatchReport, ImportSession, LogStore, PendingLine};

/// Default lines per transaction / 默认分块大小
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Terminal outcome / 导入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportOutcome {
    Completed,
    Interrupted,
    Failed,
}

/// Final counters / 导入统计
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub outcome: ImportOutcome,
    /// Non-empty lines read from the file / 读取的非空行
    pub lines_read: u64,
    /// Lines in chunks that committed / 已提交分块中的行数
    pub lines_submitted: u64,
    pub inserted: u64,
    pub duplicates: u64,
    pub chunks_committed: u64,
    pub failed_chunks: u64,
    pub failed_lines: u64,
    pub error: Option<String>,
}

impl ImportReport {
    fn new() -> Self {
        Self {
            outcome: ImportOutcome::Completed,
            lines_read: 0,
            lines_submitted: 0,
            inserted: 0,
            duplicates: 0,
            chunks_committed: 0,
            failed_chunks: 0,
            failed_lines: 0,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            outcome: ImportOutcome::Failed,
            error: Some(error),
            ..Self::new()
        }
    }
}

/// Destination of committed chunks / 分块写入目标
#[async_trait]
pub trait ChunkSink: Send {
    /// Commit one chunk atomically / 原子提交一个分块
    async fn commit_chunk(&mut self, lines: &[PendingLine]) -> Result<BatchReport>;

    /// Release the sink, restoring any relaxed settings / 结束写入
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[async_trait]
impl<'a> ChunkSink for ImportSession<'a> {
    async fn commit_chunk(&mut self, lines: &[PendingLine]) -> Result<BatchReport> {
        ImportSession::commit_chunk(self, lines).await
    }

    async fn close(self) -> Result<()> {
        self.finish().await
    }
}

/// Bulk importer / 批量导入器
pub struct BulkImporter {
    chunk_size: usize,
    state: Arc<ImportState>,
}

impl BulkImporter {
    pub fn new(chunk_size: usize, state: Arc<ImportState>) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            state,
        }
    }

    pub fn state(&self) -> &Arc<ImportState> {
        &self.state
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Import a file into the log store / 导入文件到日志库
    pub async fn import_file(&self, store: &LogStore, path: impl AsRef<Path>) -> ImportReport {
        self.run(path.as_ref(), || store.begin_import()).await
    }

    /// Import a file into any sink; the sink is opened only after the file is / 导入到任意目标
    pub async fn run<S, F, Fut>(&self, path: &Path, open_sink: F) -> ImportReport
    where
        S: ChunkSink,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S>>,
    {
        if !self.state.start() {
            return ImportReport::failed("Import already running".to_string());
        }
        tracing::info!("Starting import for: {:?}", path);

        let file = match open_source(path).await {
            Ok(file) => file,
            Err(e) => return self.fail(e),
        };

        let sink = match open_sink().await {
            Ok(sink) => sink,
            Err(e) => return self.fail(e),
        };

        self.stream(BufReader::new(file), sink).await
    }

    /// Stream lines from an open reader into the sink / 从已打开的输入流导入
    pub async fn stream<R, S>(&self, mut reader: R, mut sink: S) -> ImportReport
    where
        R: AsyncBufRead + Unpin + Send,
        S: ChunkSink,
    {
        self.state.set_phase(ImportPhase::Streaming);

        let mut report = ImportReport::new();
        let mut batch: Vec<PendingLine> = Vec::with_capacity(self.chunk_size.min(DEFAULT_CHUNK_SIZE));
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        let mut interrupted = false;
        let mut read_error: Option<std::io::Error> = None;

        loop {
            if self.state.is_cancelled() {
                interrupted = true;
                break;
            }

            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            }

            // invalid UTF-8 is replaced, not fatal
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }

            self.state.increment();
            report.lines_read += 1;
            batch.push(PendingLine::new(line));

            if batch.len() >= self.chunk_size {
                self.flush(&mut sink, &mut batch, &mut report).await;
            }
        }

        if interrupted {
            tracing::info!("Stopping import, {} buffered lines discarded", batch.len());
            batch.clear();
            report.outcome = ImportOutcome::Interrupted;
        } else if let Some(e) = read_error {
            tracing::error!("Read failed after {} lines: {}", report.lines_read, e);
            batch.clear();
            report.outcome = ImportOutcome::Failed;
            report.error = Some(LogError::from(e).to_string());
        } else if !batch.is_empty() {
            self.flush(&mut sink, &mut batch, &mut report).await;
        }

        self.state.set_phase(ImportPhase::Closing);
        if let Err(e) = sink.close().await {
            tracing::error!("Failed to restore database durability: {}", e);
            report.outcome = ImportOutcome::Failed;
            report.error.get_or_insert_with(|| e.to_string());
        }

        let phase = match report.outcome {
            ImportOutcome::Completed => ImportPhase::Completed,
            ImportOutcome::Interrupted => ImportPhase::Interrupted,
            ImportOutcome::Failed => ImportPhase::Failed,
        };
        self.state.finish(phase, report.error.clone());

        tracing::info!(
            "Import finished ({:?}): {} lines read, {} submitted, {} new, {} duplicates, {} failed chunks",
            report.outcome,
            report.lines_read,
            report.lines_submitted,
            report.inserted,
            report.duplicates,
            report.failed_chunks
        );
        report
    }

    async fn flush<S: ChunkSink>(&self, sink: &mut S, batch: &mut Vec<PendingLine>, report: &mut ImportReport) {
        self.state.set_phase(ImportPhase::Flushing);
        let chunk_no = report.chunks_committed + report.failed_chunks + 1;
        let size = batch.len() as u64;

        match sink.commit_chunk(batch.as_slice()).await {
            Ok(result) => {
                report.chunks_committed += 1;
                report.lines_submitted += size;
                report.inserted += result.inserted;
                report.duplicates += result.duplicates;
                tracing::info!(
                    "Chunk {} committed: {} lines ({} new), {} lines read so far",
                    chunk_no,
                    size,
                    result.inserted,
                    report.lines_read
                );
            }
            Err(e) => {
                report.failed_chunks += 1;
                report.failed_lines += size;
                tracing::warn!("Error writing chunk {} ({} lines): {}", chunk_no, size, e);
            }
        }

        batch.clear();
        self.state.record_chunk(report.lines_submitted, report.failed_chunks);
        self.state.set_phase(ImportPhase::Streaming);
    }

    fn fail(&self, error: LogError) -> ImportReport {
        tracing::error!("Import failed: {}", error);
        let report = ImportReport::failed(error.to_string());
        self.state.finish(ImportPhase::Failed, report.error.clone());
        report
    }
}

/// Opening: the source must be an existing readable file / 打开输入文件
async fn open_source(path: &Path) -> Result<tokio::fs::File> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LogError::validation(format!("File {} not found", path.display())),
        _ => LogError::validation(format!("Cannot read {}: {}", path.display(), e)),
    })?;
    if !metadata.is_file() {
        return Err(LogError::validation(format!("{} is not a regular file", path.display())));
    }

    tokio::fs::File::open(path)
        .await
        .map_err(|e| LogError::validation(format!("Cannot read {}: {}", path.display(), e)))
}
