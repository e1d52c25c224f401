// ==========================================
// 港口到港舱单系统 - 满意度反馈仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::feedback::{Feedback, FeedbackCreate};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct FeedbackRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeedbackRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Feedback> {
        Ok(Feedback {
            id: row.get(0)?,
            rating: row.get(1)?,
            comments: row.get(2)?,
            role: row.get(3)?,
            user_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn insert(&self, feedback: &FeedbackCreate, user_id: Option<i64>) -> RepositoryResult<Feedback> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO feedback (rating, comments, role, user_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![feedback.rating, feedback.comments, feedback.role, user_id, Utc::now()],
        )?;
        let id = conn.last_insert_rowid();
        let saved = conn.query_row(
            "SELECT id, rating, comments, role, user_id, created_at FROM feedback WHERE id = ?1",
            params![id],
            Self::map_row,
        )?;
        Ok(saved)
    }

    /// 分页查询（按提交时间倒序）
    pub fn list(&self, skip: i64, limit: i64) -> RepositoryResult<Vec<Feedback>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, rating, comments, role, user_id, created_at FROM feedback ORDER BY id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit, skip], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
