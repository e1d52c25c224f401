// ==========================================
// 港口到港舱单系统 - 配置管理器
// ==========================================
// 职责: 运行期配置查询与覆写
// 存储: config_kv 表 (key-value + scope)，当前只使用 scope_id='global'
// ==========================================

use crate::config::import_config_trait::IngestConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::import::{RowPolicy, SheetKind};
use crate::importer::sheet_schema::SheetLayout;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// 配置键
pub mod config_keys {
    pub const PASSENGER_LAYOUT: &str = "ingest/passenger_layout";
    pub const CREW_LAYOUT: &str = "ingest/crew_layout";
    pub const ROW_POLICY: &str = "ingest/row_policy";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（key → value）
    pub fn get_config_snapshot(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut snapshot = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 保存表格布局覆写（写入前校验）
    pub fn set_sheet_layout(&self, layout: &SheetLayout) -> RepositoryResult<()> {
        layout
            .validate()
            .map_err(|e| RepositoryError::ValidationError(e.to_string()))?;
        let key = layout_key(layout.kind);
        self.set_global_config_value(key, &serde_json::to_string(layout)?)
    }

    pub fn set_row_policy(&self, policy: RowPolicy) -> RepositoryResult<()> {
        self.set_global_config_value(config_keys::ROW_POLICY, &serde_json::to_string(&policy)?)
    }
}

fn layout_key(kind: SheetKind) -> &'static str {
    match kind {
        SheetKind::Passenger => config_keys::PASSENGER_LAYOUT,
        SheetKind::Crew => config_keys::CREW_LAYOUT,
    }
}

// ==========================================
// IngestConfigReader Trait 实现
// ==========================================
#[async_trait]
impl IngestConfigReader for ConfigManager {
    async fn get_sheet_layout(&self, kind: SheetKind) -> RepositoryResult<SheetLayout> {
        let key = layout_key(kind);
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(SheetLayout::default_for(kind));
        };

        let parsed = serde_json::from_str::<SheetLayout>(&raw)
            .map_err(|e| e.to_string())
            .and_then(|layout| {
                if layout.kind != kind {
                    return Err(format!("布局类型不符: 期望 {}, 实际 {}", kind, layout.kind));
                }
                layout.validate().map_err(|e| e.to_string())?;
                Ok(layout)
            });

        match parsed {
            Ok(layout) => Ok(layout),
            Err(reason) => {
                warn!(config_key = key, reason = %reason, "表格布局配置无效，使用默认布局");
                Ok(SheetLayout::default_for(kind))
            }
        }
    }

    async fn get_row_policy(&self) -> RepositoryResult<RowPolicy> {
        let Some(raw) = self.get_global_config_value(config_keys::ROW_POLICY)? else {
            return Ok(RowPolicy::default());
        };
        // 兼容带引号的 JSON 字符串与裸值
        match raw.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "partial" => Ok(RowPolicy::Partial),
            "atomic" => Ok(RowPolicy::Atomic),
            other => {
                warn!(config_key = config_keys::ROW_POLICY, raw_value = %other, "行策略配置无效，使用 partial");
                Ok(RowPolicy::Partial)
            }
        }
    }
}
