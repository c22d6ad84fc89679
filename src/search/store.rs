//! 日志内容存储 - SHA256 去重 + FTS5 全文索引
//!
//! 存储方案：
//! - logs_raw表：id + content + content_hash(UNIQUE)，去重键为内容指纹
//! - logs_fts表：FTS5 外部内容索引，rowid 与 logs_raw.id 一致
//! - 索引同步在写入的同一事务内显式执行（见 sync 模块），不使用触发器
//!
//! 特性：
//! - 单个 SQLite 文件 + WAL模式（读写并发，读者看到一致快照）
//! - 进程内写锁串行化写入，跨进程依赖 SQLite 写锁 + busy_timeout
//! - 批量写入一个事务提交，失败整体回滚

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Connection, Pool, Sqlite, SqliteConnection};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::schema::{
    BatchReport, InsertOutcome, LogLine, PendingLine, StoreStats, CREATE_LOGS_FTS, CREATE_LOGS_RAW,
    CREATE_LOGS_VOCAB,
};
use super::sync;
use crate::error::{LogError, Result};

/// SQLite 变量上限以内的 IN 查询分片
const ID_LOOKUP_CHUNK: usize = 500;

/// 日志存储
pub struct LogStore {
    db: Pool<Sqlite>,
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LogStore {
    /// 打开（必要时创建）日志数据库 / Open or create the log database
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // 确保目录存在
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // 每个连接都启用 WAL / NORMAL / busy_timeout
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        tracing::info!("Log database opened: {:?} (WAL mode)", path);

        Ok(Self {
            db,
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// 打开并初始化表结构
    pub async fn open_and_init(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::open(path).await?;
        store.init().await?;
        Ok(store)
    }

    /// 关闭数据库连接池 / Close database connection pool
    pub async fn close(&self) {
        self.db.close().await;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }

    /// 初始化表结构，可重复调用，不删除已有数据
    pub async fn init(&self) -> Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query(CREATE_LOGS_RAW).execute(&mut *tx).await?;
        sqlx::query(CREATE_LOGS_FTS).execute(&mut *tx).await?;
        sqlx::query(CREATE_LOGS_VOCAB).execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!("Log store initialized with FTS5 index");
        Ok(())
    }

    /// 写入单行（去重 + 同步索引，同一事务）
    pub async fn insert(&self, content: &str) -> Result<InsertOutcome> {
        let line = PendingLine::new(content);

        let _guard = self.write_lock.lock().await;
        let mut tx = self.db.begin().await?;
        let outcome = sync::insert_line(&mut tx, &line).await?;
        tx.commit().await?;

        Ok(outcome)
    }

    /// 批量写入，整个批次一个事务
    pub async fn insert_batch(&self, lines: &[PendingLine]) -> Result<BatchReport> {
        if lines.is_empty() {
            return Ok(BatchReport::default());
        }

        // 先拿写锁再取连接，与 insert / delete 顺序一致
        let _guard = self.write_lock.lock().await;
        let mut conn = self.db.acquire().await?;
        Self::write_batch(&mut conn, lines).await
    }

    /// 在指定连接上写入一个批次；调用方须持有写锁
    async fn write_batch(conn: &mut SqliteConnection, lines: &[PendingLine]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        if lines.is_empty() {
            return Ok(report);
        }

        let mut tx = conn.begin().await?;
        for line in lines {
            report.record(sync::insert_line(&mut tx, line).await?);
        }
        tx.commit().await?;

        Ok(report)
    }

    /// 删除一行及其索引条目；当前流程不使用，保证索引一致性
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.db.begin().await?;
        let deleted = sync::delete_line(&mut tx, id).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    /// 按给定id顺序返回内容，缺失的id跳过
    pub async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<String>> {
        let mut conn = self.db.acquire().await?;
        Ok(Self::fetch_contents(&mut conn, ids).await?)
    }

    pub(crate) async fn fetch_contents(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> std::result::Result<Vec<String>, sqlx::Error> {
        let mut by_id: HashMap<i64, String> = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(ID_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!("SELECT id, content FROM logs_raw WHERE id IN ({})", placeholders);

            let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            by_id.extend(query.fetch_all(&mut *conn).await?);
        }

        // 按请求顺序输出；重复id各输出一次
        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Option<LogLine>> {
        let line = sqlx::query_as::<_, LogLine>("SELECT id, content, content_hash FROM logs_raw WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(line)
    }

    pub async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<LogLine>> {
        let line = sqlx::query_as::<_, LogLine>(
            "SELECT id, content, content_hash FROM logs_raw WHERE content_hash = ?",
        )
        .bind(fingerprint)
        .fetch_optional(&self.db)
        .await?;
        Ok(line)
    }

    /// 行数
    pub async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM logs_raw")
            .fetch_one(&self.db)
            .await?;
        Ok(count as u64)
    }

    /// 存储中的全部id（升序）
    pub async fn stored_ids(&self) -> Result<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM logs_raw ORDER BY id")
            .fetch_all(&self.db)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// 索引中实际存在的id（升序），直接读取倒排数据而非外部内容表
    /// 不含任何词元的行不会出现在这里
    pub async fn indexed_ids(&self) -> Result<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as("SELECT DISTINCT doc FROM logs_vocab ORDER BY doc")
            .fetch_all(&self.db)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// 从 logs_raw 重建全文索引
    pub async fn rebuild_index(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.db.begin().await?;
        sync::rebuild(&mut tx).await?;
        tx.commit().await?;

        tracing::info!("Full-text index rebuilt from log store");
        Ok(())
    }

    /// 获取统计信息
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            line_count: self.count().await?,
            db_size: Self::get_db_size(&self.path),
        })
    }

    /// 获取数据库文件大小（含 WAL / SHM）
    pub fn get_db_size(path: &Path) -> u64 {
        ["", "-wal", "-shm"]
            .iter()
            .map(|suffix| {
                let mut name = OsString::from(path.as_os_str());
                name.push(suffix);
                std::fs::metadata(PathBuf::from(name)).map(|m| m.len()).unwrap_or(0)
            })
            .sum()
    }

    /// 开始导入会话：独占一个连接并降低同步级别
    pub async fn begin_import(&self) -> Result<ImportSession<'_>> {
        let mut conn = self.db.acquire().await?;

        sqlx::query("PRAGMA synchronous = OFF").execute(&mut *conn).await?;
        sqlx::query("PRAGMA cache_size = 10000").execute(&mut *conn).await?;

        tracing::debug!("Import session opened (synchronous=OFF)");
        Ok(ImportSession {
            store: self,
            conn: Some(conn),
        })
    }
}

/// 导入会话：持有独立连接，结束时恢复默认同步级别
///
/// 未调用 `finish` 就被丢弃时（任务取消、panic），该连接直接关闭，
/// 不会以 synchronous=OFF 的状态回到连接池。
pub struct ImportSession<'a> {
    store: &'a LogStore,
    conn: Option<PoolConnection<Sqlite>>,
}

impl ImportSession<'_> {
    fn conn(&mut self) -> Result<&mut PoolConnection<Sqlite>> {
        self.conn
            .as_mut()
            .ok_or_else(|| LogError::Storage("import session already closed".to_string()))
    }

    /// 提交一个分块（单事务）
    pub async fn commit_chunk(&mut self, lines: &[PendingLine]) -> Result<BatchReport> {
        let store = self.store;
        let _guard = store.write_lock.lock().await;
        LogStore::write_batch(self.conn()?, lines).await
    }

    /// 恢复 synchronous=NORMAL；恢复失败时不把该连接还给连接池
    pub async fn finish(mut self) -> Result<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        let restored = async {
            sqlx::query("PRAGMA synchronous = NORMAL").execute(&mut *conn).await?;
            sqlx::query("PRAGMA cache_size = -2000").execute(&mut *conn).await?;
            Ok::<_, sqlx::Error>(())
        }
        .await;

        match restored {
            Ok(()) => {
                tracing::debug!("Import session closed (synchronous=NORMAL)");
                Ok(())
            }
            Err(e) => {
                let raw = conn.detach();
                raw.close().await.ok();
                Err(LogError::from(e))
            }
        }
    }

    pub async fn synchronous_level(&mut self) -> Result<i64> {
        let (level,): (i64,) = sqlx::query_as("PRAGMA synchronous")
            .fetch_one(&mut **self.conn()?)
            .await?;
        Ok(level)
    }
}

impl Drop for ImportSession<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("Import session dropped before finish, closing its connection");
            // 脱离连接池后丢弃即关闭
            drop(conn.detach());
        }
    }
}
