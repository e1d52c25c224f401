// ==========================================
// 港口到港舱单系统 - 导入报告模型
// ==========================================
// 单元格级问题 → FieldWarning（不阻断）
// 行级问题     → RowRejected（按行策略处理）
// ==========================================

use crate::domain::manifest::{Manifest, VoyageHeader};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 来源表（旅客表 / 船员表）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Passenger,
    Crew,
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetKind::Passenger => write!(f, "passenger"),
            SheetKind::Crew => write!(f, "crew"),
        }
    }
}

/// 单元格解析告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub sheet: SheetKind,
    pub row_index: usize,
    pub field: String,
    pub raw_value: String,
    pub reason: String,
}

/// 行拒收（必填字段缺失）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRejected {
    pub sheet: SheetKind,
    pub row_index: usize,
    pub missing_fields: Vec<String>,
}

impl fmt::Display for RowRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 表第 {} 行缺少必填字段: {}",
            self.sheet,
            self.row_index,
            self.missing_fields.join(", ")
        )
    }
}

/// 行级策略
///
/// - Partial: 拒收行跳过，其余行照常入库，拒收明细随结果返回
/// - Atomic: 任一行拒收则整个上传失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    #[default]
    Partial,
    Atomic,
}

/// 导入报告（随舱单持久化，可追溯）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub passenger_rows_total: usize,
    pub passengers_accepted: usize,
    pub crew_rows_total: usize,
    pub crew_accepted: usize,
    pub rejected: Vec<RowRejected>,
    pub warnings: Vec<FieldWarning>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    pub fn has_issues(&self) -> bool {
        !self.rejected.is_empty() || !self.warnings.is_empty()
    }
}

// ==========================================
// 上传输入 / 导入结果
// ==========================================

/// 上传的原始文件
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 一次舱单上传（表头 + 旅客表 + 船员表）
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestUpload {
    pub header: VoyageHeader,
    pub passenger_file: Option<UploadedFile>,
    pub crew_file: Option<UploadedFile>,
    pub uploaded_by: Option<i64>,
}

/// 导入结果（已落库舱单 + 导入报告）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub manifest: Manifest,
    pub report: ImportReport,
}
