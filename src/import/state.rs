use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Importer lifecycle / 导入状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportPhase {
    Idle,
    Opening,
    Streaming,
    Flushing,
    Closing,
    Completed,
    Interrupted,
    Failed,
}

impl ImportPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportPhase::Completed | ImportPhase::Interrupted | ImportPhase::Failed)
    }
}

/// Import progress snapshot / 导入进度
#[derive(Debug, Clone, Serialize)]
pub struct ImportProgress {
    pub phase: ImportPhase,
    pub lines_read: u64,
    pub lines_submitted: u64,
    pub failed_chunks: u64,
    pub error: Option<String>,
    pub last_done_time: Option<i64>,
}

impl Default for ImportProgress {
    fn default() -> Self {
        Self {
            phase: ImportPhase::Idle,
            lines_read: 0,
            lines_submitted: 0,
            failed_chunks: 0,
            error: None,
            last_done_time: None,
        }
    }
}

/// Import state management, shared with signal handlers and observers / 导入状态管理
pub struct ImportState {
    pub running: AtomicBool,
    pub lines_read: AtomicU64,
    pub progress: RwLock<ImportProgress>,
    pub cancel_flag: AtomicBool,
}

impl ImportState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            lines_read: AtomicU64::new(0),
            progress: RwLock::new(ImportProgress::default()),
            cancel_flag: AtomicBool::new(false),
        }
    }

    /// Claim the state for a new run; false if one is already running / 开始导入
    pub fn start(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.lines_read.store(0, Ordering::SeqCst);
        let mut progress = self.progress.write();
        *progress = ImportProgress {
            phase: ImportPhase::Opening,
            last_done_time: progress.last_done_time,
            ..ImportProgress::default()
        };
        true
    }

    pub fn set_phase(&self, phase: ImportPhase) {
        self.progress.write().phase = phase;
    }

    /// Count one non-empty line / 计数一行
    pub fn increment(&self) -> u64 {
        self.lines_read.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Publish chunk results / 更新分块结果
    pub fn record_chunk(&self, lines_submitted: u64, failed_chunks: u64) {
        let mut progress = self.progress.write();
        progress.lines_read = self.lines_read.load(Ordering::Relaxed);
        progress.lines_submitted = lines_submitted;
        progress.failed_chunks = failed_chunks;
    }

    pub fn finish(&self, phase: ImportPhase, error: Option<String>) {
        self.running.store(false, Ordering::SeqCst);
        let mut progress = self.progress.write();
        progress.phase = phase;
        progress.lines_read = self.lines_read.load(Ordering::Relaxed);
        progress.error = error;
        progress.last_done_time = Some(chrono::Utc::now().timestamp());
    }

    /// Request interruption; the importer stops at the next line / 请求中断
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Clear a previous cancel request before a new run / 重置中断标记
    pub fn reset_cancel(&self) {
        self.cancel_flag.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn get_progress(&self) -> ImportProgress {
        self.progress.read().clone()
    }
}

impl Default for ImportState {
    fn default() -> Self {
        Self::new()
    }
}
