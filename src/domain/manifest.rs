// ==========================================
// 港口到港舱单系统 - 舱单领域模型
// ==========================================
// 舱单 = 航次表头 + 旅客列表 + 船员列表
// 表头在导入成功后不再修改；子记录生命周期随舱单
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// VoyageHeader - 航次表头
// ==========================================
// 来源: 上传表单字段（非 Excel）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoyageHeader {
    pub ship_name: String,              // 船名
    pub flag: Option<String>,           // 船旗国
    pub skipper_name: Option<String>,   // 船长
    pub origin: String,                 // 出发港
    pub destination: String,            // 目的港
    pub arrival_date: NaiveDate,        // 到港日期
    pub departure_date: Option<NaiveDate>, // 离港日期
}

// ==========================================
// PassengerRecord - 校验通过的旅客行
// ==========================================
// 用途: 导入管道产物，尚未落库（无 id）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRecord {
    pub row_index: usize, // Excel 行号（1 起）
    pub name: String,
    pub sex: Option<String>,
    pub birth_place: Option<String>,
    pub dob: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub passport_no: String,
    pub remarks: Option<String>,
}

// ==========================================
// CrewRecord - 校验通过的船员行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewRecord {
    pub row_index: usize,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub passport_no: Option<String>,
    pub passport_expiry: Option<NaiveDate>,
    pub seaman_book_no: Option<String>,
    pub seaman_book_expiry: Option<NaiveDate>,
    pub rank: Option<String>,
}

// ==========================================
// NewManifest - 待落库的舱单聚合
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewManifest {
    pub header: VoyageHeader,
    pub passengers: Vec<PassengerRecord>,
    pub crews: Vec<CrewRecord>,
    pub passenger_file_url: Option<String>,
    pub crew_file_url: Option<String>,
    pub uploaded_by: Option<i64>,
}

// ==========================================
// Passenger - 已落库旅客
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: i64,
    pub manifest_id: i64,
    pub seq_no: i32,
    pub name: String,
    pub sex: Option<String>,
    pub birth_place: Option<String>,
    pub dob: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub passport_no: String,
    pub remarks: Option<String>,
}

// ==========================================
// Crew - 已落库船员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crew {
    pub id: i64,
    pub manifest_id: i64,
    pub seq_no: i32,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub passport_no: Option<String>,
    pub passport_expiry: Option<NaiveDate>,
    pub seaman_book_no: Option<String>,
    pub seaman_book_expiry: Option<NaiveDate>,
    pub rank: Option<String>,
}

/// 船员证件补录（仅护照字段可改）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewUpdate {
    pub passport_no: Option<String>,
    pub passport_expiry: Option<NaiveDate>,
}

// ==========================================
// Manifest - 已落库舱单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: i64,
    pub ship_name: String,
    pub flag: Option<String>,
    pub skipper_name: Option<String>,
    pub origin: String,
    pub destination: String,
    pub arrival_date: NaiveDate,
    pub departure_date: Option<NaiveDate>,
    pub passenger_file_url: Option<String>,
    pub crew_file_url: Option<String>,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub passengers: Vec<Passenger>,
    pub crews: Vec<Crew>,
}
