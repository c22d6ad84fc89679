//! Store → index synchronization / 存储与全文索引同步
//!
//! Every mutation of logs_raw goes through these functions on the same
//! connection, inside the caller's transaction. There are no database
//! triggers: the row and its index entry commit or roll back together.

use sqlx::SqliteConnection;

use super::schema::{InsertOutcome, PendingLine};

/// Insert one line and, if it is new, index it / 写入一行，若为新行则同步到索引
pub async fn insert_line(
    conn: &mut SqliteConnection,
    line: &PendingLine,
) -> Result<InsertOutcome, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO logs_raw (content, content_hash) VALUES (?, ?)")
        .bind(&line.content)
        .bind(&line.fingerprint)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(InsertOutcome::Duplicate);
    }

    let id = result.last_insert_rowid();
    index_line(conn, id, &line.content).await?;
    Ok(InsertOutcome::Inserted(id))
}

/// Delete one row and its index entry; false if no such row / 删除一行及其索引
pub async fn delete_line(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let content: Option<(String,)> = sqlx::query_as("SELECT content FROM logs_raw WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some((content,)) = content else {
        return Ok(false);
    };

    // external content tables need the old text to remove its tokens
    unindex_line(conn, id, &content).await?;

    sqlx::query("DELETE FROM logs_raw WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(true)
}

/// Add an index entry for a stored row / 添加索引条目
pub async fn index_line(conn: &mut SqliteConnection, id: i64, content: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO logs_fts (rowid, content) VALUES (?, ?)")
        .bind(id)
        .bind(content)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Remove the index entry of a stored row / 删除索引条目
pub async fn unindex_line(conn: &mut SqliteConnection, id: i64, content: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO logs_fts (logs_fts, rowid, content) VALUES ('delete', ?, ?)")
        .bind(id)
        .bind(content)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Regenerate the whole index from logs_raw / 从原始表重建索引
pub async fn rebuild(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO logs_fts (logs_fts) VALUES ('rebuild')")
        .execute(&mut *conn)
        .await?;
    Ok(())
}
