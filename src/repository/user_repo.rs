// ==========================================
// 港口到港舱单系统 - 用户仓储
// ==========================================
// 红线: Repository 不含业务逻辑（口令哈希在 auth 层完成）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::Role;
use crate::domain::user::{NewUser, User};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, photo_url, created_at";

/// 用户仓储
/// 职责: 管理 users 表的 CRUD 操作
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
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

    fn map_row(row: &Row) -> rusqlite::Result<User> {
        let role_raw: String = row.get(4)?;
        let role = Role::parse(&role_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("未知角色: {}", role_raw).into(),
            )
        })?;
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role,
            photo_url: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// 新建用户
    ///
    /// # 返回
    /// - Ok(User): 新用户
    /// - Err(UniqueConstraintViolation): 邮箱已注册
    pub fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO users (name, email, password_hash, role, photo_url, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.name,
                user.email,
                user.password_hash,
                user.role.to_db_str(),
                user.photo_url,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        let created = conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            Self::map_row,
        )?;
        Ok(created)
    }

    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                Self::map_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<User>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// 修改显示名
    ///
    /// # 返回
    /// - Ok(None): 用户不存在
    pub fn update_name(&self, id: i64, name: &str) -> RepositoryResult<Option<User>> {
        {
            let conn = self.get_conn()?;
            let affected = conn.execute("UPDATE users SET name = ?1 WHERE id = ?2", params![name, id])?;
            if affected == 0 {
                return Ok(None);
            }
        }
        self.find_by_id(id)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn repo() -> UserRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        UserRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Petugas".to_string(),
            email: email.to_string(),
            password_hash: "salt$hash".to_string(),
            role,
            photo_url: None,
        }
    }

    #[test]
    fn test_create_and_find() {
        let repo = repo();
        let created = repo.create(new_user("agen@example.com", Role::Agen)).unwrap();

        let found = repo.find_by_email("agen@example.com").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Agen);
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_email_is_unique_violation() {
        let repo = repo();
        repo.create(new_user("dup@example.com", Role::Agen)).unwrap();
        let err = repo.create(new_user("dup@example.com", Role::Admin)).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_update_name() {
        let repo = repo();
        let user = repo.create(new_user("a@example.com", Role::Imigrasi)).unwrap();
        let updated = repo.update_name(user.id, "Budi").unwrap().unwrap();
        assert_eq!(updated.name, "Budi");
        assert!(repo.update_name(9999, "X").unwrap().is_none());
    }
}
