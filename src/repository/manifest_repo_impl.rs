// ==========================================
// 港口到港舱单系统 - 舱单 Repository 实现
// ==========================================
// 职责: 实现舱单相关数据访问（使用 rusqlite）
// 事务边界: 舱单 + 全部子记录 + 导入报告 原子写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import::ImportReport;
use crate::domain::manifest::{Crew, CrewUpdate, Manifest, NewManifest, Passenger};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::manifest_repo::ManifestRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const MANIFEST_COLUMNS: &str = "id, ship_name, flag, skipper_name, origin, destination, arrival_date, \
     departure_date, passenger_file_url, crew_file_url, uploaded_by, created_at";

const PASSENGER_COLUMNS: &str =
    "id, manifest_id, seq_no, name, sex, birth_place, dob, nationality, passport_no, remarks";

const CREW_COLUMNS: &str = "id, manifest_id, seq_no, name, dob, passport_no, passport_expiry, \
     seaman_book_no, seaman_book_expiry, rank";

// ==========================================
// ManifestRepositoryImpl
// ==========================================
pub struct ManifestRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ManifestRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_manifest_row(row: &Row) -> rusqlite::Result<Manifest> {
        Ok(Manifest {
            id: row.get(0)?,
            ship_name: row.get(1)?,
            flag: row.get(2)?,
            skipper_name: row.get(3)?,
            origin: row.get(4)?,
            destination: row.get(5)?,
            arrival_date: row.get(6)?,
            departure_date: row.get(7)?,
            passenger_file_url: row.get(8)?,
            crew_file_url: row.get(9)?,
            uploaded_by: row.get(10)?,
            created_at: row.get(11)?,
            passengers: Vec::new(),
            crews: Vec::new(),
        })
    }

    fn map_passenger_row(row: &Row) -> rusqlite::Result<Passenger> {
        Ok(Passenger {
            id: row.get(0)?,
            manifest_id: row.get(1)?,
            seq_no: row.get(2)?,
            name: row.get(3)?,
            sex: row.get(4)?,
            birth_place: row.get(5)?,
            dob: row.get(6)?,
            nationality: row.get(7)?,
            passport_no: row.get(8)?,
            remarks: row.get(9)?,
        })
    }

    fn map_crew_row(row: &Row) -> rusqlite::Result<Crew> {
        Ok(Crew {
            id: row.get(0)?,
            manifest_id: row.get(1)?,
            seq_no: row.get(2)?,
            name: row.get(3)?,
            dob: row.get(4)?,
            passport_no: row.get(5)?,
            passport_expiry: row.get(6)?,
            seaman_book_no: row.get(7)?,
            seaman_book_expiry: row.get(8)?,
            rank: row.get(9)?,
        })
    }

    /// 加载子记录（按 seq_no 保持上传顺序）
    fn load_children(conn: &Connection, manifest: &mut Manifest) -> RepositoryResult<()> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM passengers WHERE manifest_id = ?1 ORDER BY seq_no",
            PASSENGER_COLUMNS
        ))?;
        manifest.passengers = stmt
            .query_map(params![manifest.id], Self::map_passenger_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM crews WHERE manifest_id = ?1 ORDER BY seq_no",
            CREW_COLUMNS
        ))?;
        manifest.crews = stmt
            .query_map(params![manifest.id], Self::map_crew_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    fn insert_manifest_tx(tx: &Transaction, manifest: &NewManifest, report: &ImportReport) -> RepositoryResult<i64> {
        let header = &manifest.header;
        tx.execute(
            r#"
            INSERT INTO manifests (
                ship_name, flag, skipper_name, origin, destination, arrival_date,
                departure_date, passenger_file_url, crew_file_url, uploaded_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                header.ship_name,
                header.flag,
                header.skipper_name,
                header.origin,
                header.destination,
                header.arrival_date,
                header.departure_date,
                manifest.passenger_file_url,
                manifest.crew_file_url,
                manifest.uploaded_by,
                Utc::now(),
            ],
        )?;
        let manifest_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO passengers (
                    manifest_id, seq_no, name, sex, birth_place, dob, nationality, passport_no, remarks
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;
            for (idx, p) in manifest.passengers.iter().enumerate() {
                stmt.execute(params![
                    manifest_id,
                    (idx + 1) as i64,
                    p.name,
                    p.sex,
                    p.birth_place,
                    p.dob,
                    p.nationality,
                    p.passport_no,
                    p.remarks,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO crews (
                    manifest_id, seq_no, name, dob, passport_no, passport_expiry,
                    seaman_book_no, seaman_book_expiry, rank
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;
            for (idx, c) in manifest.crews.iter().enumerate() {
                stmt.execute(params![
                    manifest_id,
                    (idx + 1) as i64,
                    c.name,
                    c.dob,
                    c.passport_no,
                    c.passport_expiry,
                    c.seaman_book_no,
                    c.seaman_book_expiry,
                    c.rank,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO import_report (manifest_id, batch_id, report_json, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![manifest_id, report.batch_id, serde_json::to_string(report)?, Utc::now()],
        )?;

        Ok(manifest_id)
    }
}

#[async_trait]
impl ManifestRepository for ManifestRepositoryImpl {
    async fn insert_manifest(&self, manifest: NewManifest, report: &ImportReport) -> RepositoryResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let manifest_id = Self::insert_manifest_tx(&tx, &manifest, report)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            manifest_id,
            passengers = manifest.passengers.len(),
            crews = manifest.crews.len(),
            "舱单已落库"
        );
        Ok(manifest_id)
    }

    async fn list_manifests(&self, skip: i64, limit: i64) -> RepositoryResult<Vec<Manifest>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM manifests ORDER BY id LIMIT ?1 OFFSET ?2",
            MANIFEST_COLUMNS
        ))?;
        let mut manifests = stmt
            .query_map(params![limit, skip], Self::map_manifest_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for manifest in manifests.iter_mut() {
            Self::load_children(&conn, manifest)?;
        }
        debug!(count = manifests.len(), skip, limit, "查询舱单列表");
        Ok(manifests)
    }

    async fn find_manifest(&self, id: i64) -> RepositoryResult<Option<Manifest>> {
        let conn = self.lock()?;
        let manifest = conn
            .query_row(
                &format!("SELECT {} FROM manifests WHERE id = ?1", MANIFEST_COLUMNS),
                params![id],
                Self::map_manifest_row,
            )
            .optional()?;

        match manifest {
            Some(mut m) => {
                Self::load_children(&conn, &mut m)?;
                Ok(Some(m))
            }
            None => Ok(None),
        }
    }

    async fn update_crew(&self, crew_id: i64, update: CrewUpdate) -> RepositoryResult<Option<Crew>> {
        let conn = self.lock()?;
        let affected = conn.execute(
            r#"
            UPDATE crews
            SET passport_no = COALESCE(?1, passport_no),
                passport_expiry = COALESCE(?2, passport_expiry)
            WHERE id = ?3
            "#,
            params![update.passport_no, update.passport_expiry, crew_id],
        )?;
        if affected == 0 {
            return Ok(None);
        }

        let crew = conn.query_row(
            &format!("SELECT {} FROM crews WHERE id = ?1", CREW_COLUMNS),
            params![crew_id],
            Self::map_crew_row,
        )?;
        Ok(Some(crew))
    }

    async fn find_import_report(&self, manifest_id: i64) -> RepositoryResult<Option<ImportReport>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT report_json FROM import_report WHERE manifest_id = ?1",
                params![manifest_id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
