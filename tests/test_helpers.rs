// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use calamine::{Data, Range};
use chrono::NaiveDate;
use port_manifest::config::ServerConfig;
use port_manifest::db::{init_schema, open_sqlite_connection};
use port_manifest::domain::manifest::{NewManifest, PassengerRecord, VoyageHeader};
use port_manifest::importer::error::ImportResult;
use port_manifest::importer::file_parser::{rows_from_range, ReadOptions, SheetData};
use port_manifest::importer::SheetReader;
use std::error::Error;
use std::path::Path;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 测试用服务配置
pub fn test_config(db_path: &str, upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        port: 0,
        db_path: db_path.to_string(),
        upload_dir: upload_dir.to_path_buf(),
        public_base_url: "http://localhost:8000/uploads".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        token_ttl_hours: 1,
        admin_password: "admin-pw".to_string(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn voyage_header(origin: &str, destination: &str, arrival: NaiveDate) -> VoyageHeader {
    VoyageHeader {
        ship_name: "KM SINABUNG".to_string(),
        flag: Some("ID".to_string()),
        skipper_name: Some("Capt. Hasan".to_string()),
        origin: origin.to_string(),
        destination: destination.to_string(),
        arrival_date: arrival,
        departure_date: None,
    }
}

pub fn passenger(row_index: usize, name: &str, sex: &str, dob: Option<NaiveDate>, nationality: &str) -> PassengerRecord {
    PassengerRecord {
        row_index,
        name: name.to_string(),
        sex: Some(sex.to_string()),
        birth_place: None,
        dob,
        nationality: Some(nationality.to_string()),
        passport_no: format!("P{:05}", row_index),
        remarks: None,
    }
}

pub fn new_manifest(header: VoyageHeader, passengers: Vec<PassengerRecord>) -> NewManifest {
    NewManifest {
        header,
        passengers,
        crews: Vec::new(),
        passenger_file_url: None,
        crew_file_url: None,
        uploaded_by: None,
    }
}

// ==========================================
// 内存工作表
// ==========================================

fn s(v: &str) -> Data {
    Data::String(v.to_string())
}

/// 旅客表：表头 + 3 行（第 3 行缺护照号）
pub fn passenger_range() -> Range<Data> {
    let mut r = Range::new((0, 0), (3, 5));
    let header = [
        "HEADER NAME PASSENGER",
        "GENDER",
        "DATE OF BIRTH \n(DD/MM/YYYY)",
        "NATIONALITY",
        "PASSPORT NO.",
        "REMARKS",
    ];
    for (col, label) in header.iter().enumerate() {
        r.set_value((0, col as u32), s(label));
    }

    r.set_value((1, 0), s("ALICE"));
    r.set_value((1, 1), s("F"));
    r.set_value((1, 2), s("24/07/2020"));
    r.set_value((1, 3), s("INDONESIA"));
    r.set_value((1, 4), s("A1234"));

    r.set_value((2, 0), s("BOB"));
    r.set_value((2, 1), s("Male"));
    r.set_value((2, 3), s("SINGAPORE"));

    r.set_value((3, 0), s("CAROL"));
    r.set_value((3, 1), s("?"));
    r.set_value((3, 2), Data::Float(44036.0));
    r.set_value((3, 3), s("INDONESIA"));
    r.set_value((3, 4), s("C5678"));
    r
}

/// 船员表（Form 22）：前 17 行为表头区，两名船员后接空行与签字栏
pub fn crew_range() -> Range<Data> {
    let mut r = Range::new((0, 0), (21, 7));
    r.set_value((2, 1), s("CREW LIST"));

    r.set_value((17, 0), Data::Int(1));
    r.set_value((17, 1), s("HASAN"));
    r.set_value((17, 3), s("01/02/1975"));
    r.set_value((17, 5), s("SB-001"));
    r.set_value((17, 6), s("31/12/2026"));
    r.set_value((17, 7), s("MASTER"));

    r.set_value((18, 0), Data::Int(2));
    r.set_value((18, 1), s("DEWI"));
    r.set_value((18, 7), s("COOK"));

    r.set_value((21, 0), Data::Int(99));
    r.set_value((21, 1), s("SIGNATURE"));
    r
}

/// 以内存 Range 代替真实工作簿（按工作表名分派）
pub struct InMemoryWorkbook {
    pub passenger: Range<Data>,
    pub crew: Range<Data>,
}

impl Default for InMemoryWorkbook {
    fn default() -> Self {
        Self {
            passenger: passenger_range(),
            crew: crew_range(),
        }
    }
}

impl SheetReader for InMemoryWorkbook {
    fn read(&self, _bytes: &[u8], options: &ReadOptions) -> ImportResult<SheetData> {
        let range = if options.header_row.is_some() {
            &self.passenger
        } else {
            &self.crew
        };
        rows_from_range(range, options)
    }
}
