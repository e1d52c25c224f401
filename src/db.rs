// ==========================================
// 港口到港舱单系统 - SQLite 连接与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - 启动时幂等建表，并记录 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,
    role           TEXT NOT NULL,
    photo_url      TEXT,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS manifests (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    ship_name           TEXT NOT NULL,
    flag                TEXT,
    skipper_name        TEXT,
    origin              TEXT NOT NULL,
    destination         TEXT NOT NULL,
    arrival_date        TEXT NOT NULL,
    departure_date      TEXT,
    passenger_file_url  TEXT,
    crew_file_url       TEXT,
    uploaded_by         INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_manifests_arrival ON manifests(arrival_date);

CREATE TABLE IF NOT EXISTS passengers (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    manifest_id  INTEGER NOT NULL REFERENCES manifests(id) ON DELETE CASCADE,
    seq_no       INTEGER NOT NULL,
    name         TEXT NOT NULL,
    sex          TEXT,
    birth_place  TEXT,
    dob          TEXT,
    nationality  TEXT,
    passport_no  TEXT NOT NULL,
    remarks      TEXT
);
CREATE INDEX IF NOT EXISTS idx_passengers_manifest ON passengers(manifest_id, seq_no);

CREATE TABLE IF NOT EXISTS crews (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    manifest_id         INTEGER NOT NULL REFERENCES manifests(id) ON DELETE CASCADE,
    seq_no              INTEGER NOT NULL,
    name                TEXT NOT NULL,
    dob                 TEXT,
    passport_no         TEXT,
    passport_expiry     TEXT,
    seaman_book_no      TEXT,
    seaman_book_expiry  TEXT,
    rank                TEXT
);
CREATE INDEX IF NOT EXISTS idx_crews_manifest ON crews(manifest_id, seq_no);

CREATE TABLE IF NOT EXISTS feedback (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comments    TEXT,
    role        TEXT NOT NULL,
    user_id     INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS import_report (
    manifest_id  INTEGER PRIMARY KEY REFERENCES manifests(id) ON DELETE CASCADE,
    batch_id     TEXT NOT NULL,
    report_json  TEXT NOT NULL,
    created_at   TEXT NOT NULL
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys 与 busy_timeout 都需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        }
    }
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等建表并写入 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    match read_schema_version(conn)? {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
                [CURRENT_SCHEMA_VERSION],
            )?;
            info!(version = CURRENT_SCHEMA_VERSION, "数据库 schema 初始化完成");
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            warn!(found = v, expected = CURRENT_SCHEMA_VERSION, "schema_version 与当前代码不一致");
        }
        Some(_) => {}
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO passengers (manifest_id, seq_no, name, passport_no) VALUES (999, 1, 'X', 'P')",
            [],
        );
        assert!(result.is_err());
    }
}
