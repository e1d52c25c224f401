// ==========================================
// 港口到港舱单系统 - 字段标准化器
// ==========================================
// 职责: 原始单元格 → 类型化值（TRIM / 空值标准化 / 日期三种编码 / 性别）
// 原则: 单个坏单元格不中断批次，值置空并产出告警
// ==========================================
// 序列号日期规则（唯一口径）:
//   date = 1899-12-30 + floor(serial) 天
//   等价于旧口径 1900-01-01 + (serial - 2)，已吸收 1900 闰年偏差
//   小数部分为当天时间（秒）
// ==========================================

use crate::domain::import::{FieldWarning, SheetKind};
use crate::domain::types::Sex;
use crate::importer::file_parser::{CellValue, RawRow};
use crate::importer::manifest_importer_trait::CellNormalizer;
use crate::importer::sheet_schema::{FieldKind, FieldSpec, SheetLayout};
use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use tracing::debug;

/// 9999-12-31 对应的序列号
const MAX_SERIAL: f64 = 2_958_465.0;

/// 表示"无数据"的文本标记（大小写不敏感）
const SENTINEL_EMPTY: &[&str] = &["nan", "nat", "none", "null", "n/a", "#n/a", "-"];

// ===== 告警原因 =====
pub const REASON_EMPTY: &str = "empty";
pub const REASON_BAD_DATE: &str = "invalid_date_format";
pub const REASON_SERIAL_RANGE: &str = "serial_out_of_range";
pub const REASON_BAD_SEX: &str = "unrecognized_sex";
pub const REASON_BAD_TYPE: &str = "unexpected_cell_type";

// ==========================================
// NormalizedValue - 标准化后的值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    Null,
    Text(String),
    Date(NaiveDate),
}

impl NormalizedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, NormalizedValue::Null)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            NormalizedValue::Text(s) => Some(s.clone()),
            NormalizedValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            NormalizedValue::Null => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            NormalizedValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// 标准化后的一行（字段名 → 值）
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub row_index: usize,
    pub values: HashMap<String, NormalizedValue>,
}

static NULL_VALUE: NormalizedValue = NormalizedValue::Null;

impl NormalizedRow {
    pub fn get(&self, field: &str) -> &NormalizedValue {
        self.values.get(field).unwrap_or(&NULL_VALUE)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).as_text()
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        self.get(field).as_date()
    }
}

// ==========================================
// 序列号日期
// ==========================================

/// 序列号 → 日期（取整数部分）
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

/// 序列号 → 日期时间（小数部分为时间）
///
/// 秒数向下取整，日期始终与 serial_to_date 一致（不会进位到次日）
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial)?;
    let seconds = ((serial.fract() * 86_400.0).floor() as i64).clamp(0, 86_399);
    Some(date.and_time(NaiveTime::MIN) + Duration::seconds(seconds))
}

/// 是否为"无数据"
pub fn is_sentinel_empty(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty | CellValue::Error(_) => true,
        CellValue::Number(f) => f.is_nan(),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || SENTINEL_EMPTY.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
        }
        _ => false,
    }
}

/// 数值渲染为文本（整数不带 .0，护照号常被录成数字）
fn number_to_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// 纯数字文本按序列号处理
fn parse_numeric_text(s: &str) -> Option<f64> {
    if s.chars().all(|c| c.is_ascii_digit() || c == '.') && s.chars().any(|c| c.is_ascii_digit()) {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

// ==========================================
// FieldNormalizer
// ==========================================
pub struct FieldNormalizer;

impl FieldNormalizer {
    /// 文本字段: TRIM，空值标准化为 None
    pub fn normalize_text(&self, cell: &CellValue) -> Option<String> {
        if is_sentinel_empty(cell) {
            return None;
        }
        let text = match cell {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(f) => number_to_text(*f),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Empty | CellValue::Error(_) => return None,
        };
        Some(text)
    }

    /// 日期字段: 原生日期 → 序列号 → 固定格式文本
    ///
    /// # 返回
    /// - Ok(Some(date)): 解析成功
    /// - Ok(None): 空值（调用方决定是否告警）
    /// - Err(reason): 无法解析
    pub fn normalize_date(&self, cell: &CellValue, format: &str) -> Result<Option<NaiveDate>, &'static str> {
        if is_sentinel_empty(cell) {
            return Ok(None);
        }
        match cell {
            CellValue::Date(d) => Ok(Some(*d)),
            CellValue::DateTime(dt) => Ok(Some(dt.date())),
            CellValue::Number(f) => serial_to_date(*f).map(Some).ok_or(REASON_SERIAL_RANGE),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if let Some(serial) = parse_numeric_text(trimmed) {
                    return serial_to_date(serial).map(Some).ok_or(REASON_SERIAL_RANGE);
                }
                NaiveDate::parse_from_str(trimmed, format)
                    .map(Some)
                    .map_err(|_| REASON_BAD_DATE)
            }
            CellValue::Bool(_) => Err(REASON_BAD_TYPE),
            CellValue::Empty | CellValue::Error(_) => Ok(None),
        }
    }

    /// 标准化一整行
    ///
    /// # 返回
    /// - (标准化行, 本行告警)
    pub fn normalize_row(&self, layout: &SheetLayout, raw: &RawRow) -> (NormalizedRow, Vec<FieldWarning>) {
        let mut values = HashMap::with_capacity(layout.fields.len());
        let mut warnings = Vec::new();

        for spec in &layout.fields {
            let cell = raw.get(spec.candidate_labels());
            let (value, warning) = self.normalize(layout.kind, raw.row_index, spec, cell);
            if let Some(w) = warning {
                warnings.push(w);
            }
            values.insert(spec.field.clone(), value);
        }

        (
            NormalizedRow {
                row_index: raw.row_index,
                values,
            },
            warnings,
        )
    }
}

impl CellNormalizer for FieldNormalizer {
    fn normalize(
        &self,
        sheet: SheetKind,
        row_index: usize,
        spec: &FieldSpec,
        cell: &CellValue,
    ) -> (NormalizedValue, Option<FieldWarning>) {
        let warn = |reason: &str| {
            debug!(sheet = %sheet, row_index, field = %spec.field, reason, "单元格标准化告警");
            Some(FieldWarning {
                sheet,
                row_index,
                field: spec.field.clone(),
                raw_value: cell.display(),
                reason: reason.to_string(),
            })
        };

        match &spec.kind {
            FieldKind::Text | FieldKind::Ordinal => match self.normalize_text(cell) {
                Some(text) => (NormalizedValue::Text(text), None),
                None => (NormalizedValue::Null, None),
            },
            FieldKind::Sex => match self.normalize_text(cell) {
                Some(text) => match Sex::parse(&text) {
                    Some(sex) => (NormalizedValue::Text(sex.to_string()), None),
                    // 无法识别时保留原文，不丢数据
                    None => (NormalizedValue::Text(text), warn(REASON_BAD_SEX)),
                },
                None => (NormalizedValue::Null, None),
            },
            FieldKind::Date { format } => match self.normalize_date(cell, format) {
                Ok(Some(date)) => (NormalizedValue::Date(date), None),
                Ok(None) => (NormalizedValue::Null, warn(REASON_EMPTY)),
                Err(reason) => (NormalizedValue::Null, warn(reason)),
            },
        }
    }
}
