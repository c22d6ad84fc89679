//! Error types / 错误类型

/// Result alias used across the crate / 通用结果类型
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors surfaced by the store, search service and importer / 存储、搜索与导入错误
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Caller-correctable input problem (short query, missing file) / 输入错误
    #[error("{0}")]
    Validation(String),

    /// Store / index / transaction failure / 存储错误
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error while reading import input / 读取错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration load/save failure / 配置错误
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for LogError {
    fn from(err: sqlx::Error) -> Self {
        LogError::Storage(err.to_string())
    }
}

impl LogError {
    pub fn validation(message: impl Into<String>) -> Self {
        LogError::Validation(message.into())
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, LogError::Storage(_))
    }
}
