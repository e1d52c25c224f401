// ==========================================
// 港口到港舱单系统 - 电子表格读取器
// ==========================================
// 阶段 0: 原始字节 → 指定工作表 → 原始行
// 支持: .xlsx / .xlsm / .xls / .ods（calamine 自动识别）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_normalizer::serial_to_datetime;
use crate::importer::manifest_importer_trait::SheetReader;
use crate::importer::sheet_schema::{normalize_label, SheetLayout};
use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, ExcelDateTimeType, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, warn};

// ==========================================
// CellValue - 原始单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    /// 原样展示（用于告警中的 raw_value）
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.to_string(),
            CellValue::DateTime(dt) => dt.to_string(),
            CellValue::Error(e) => format!("#{}", e),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => excel_datetime_cell(dt),
            Data::DateTimeIso(s) => parse_iso_cell(s),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        }
    }
}

/// 1904 日期系统与 1900 日期系统的天数差
const EXCEL_1904_OFFSET_DAYS: f64 = 1462.0;

/// 原生日期单元格：先换算到 1900 口径，再走统一的序列号规则
fn excel_datetime_cell(dt: &ExcelDateTime) -> CellValue {
    let raw = dt.as_f64();
    if dt.is_duration() {
        return CellValue::Number(raw);
    }
    let serial = if is_1904_system(dt) {
        raw + EXCEL_1904_OFFSET_DAYS
    } else {
        raw
    };
    match serial_to_datetime(serial) {
        Some(value) => CellValue::DateTime(value),
        None => CellValue::Number(raw),
    }
}

/// calamine 不公开 1904 标记，按同值重建后比较
fn is_1904_system(dt: &ExcelDateTime) -> bool {
    *dt == ExcelDateTime::new(dt.as_f64(), ExcelDateTimeType::DateTime, true)
}

fn parse_iso_cell(s: &str) -> CellValue {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return CellValue::DateTime(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return CellValue::Date(d);
    }
    CellValue::Text(s.to_string())
}

// ==========================================
// RawRow - 原始行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Excel 行号（1 起，与用户在表格中看到的一致）
    pub row_index: usize,
    /// 标准化列名 → 单元格值
    pub cells: HashMap<String, CellValue>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl RawRow {
    /// 按候选列名取值（未命中返回 Empty）
    pub fn get<'a, I>(&'a self, labels: I) -> &'a CellValue
    where
        I: IntoIterator<Item = String>,
    {
        for label in labels {
            if let Some(value) = self.cells.get(&label) {
                return value;
            }
        }
        &EMPTY_CELL
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| match v {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        })
    }
}

/// 一张工作表的读取结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetData {
    /// 标准化后的列名（表头或 column_names）
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// ReadOptions - 读取参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    pub sheet_name: String,
    pub header_row: Option<usize>,
    pub skip_rows: usize,
    pub usecols: Option<Vec<usize>>,
    pub column_names: Vec<String>,
}

impl From<&SheetLayout> for ReadOptions {
    fn from(layout: &SheetLayout) -> Self {
        Self {
            sheet_name: layout.sheet_name.clone(),
            header_row: layout.header_row,
            skip_rows: layout.skip_rows,
            usecols: layout.usecols.clone(),
            column_names: layout.column_names.clone(),
        }
    }
}

// ==========================================
// ExcelParser - calamine 实现
// ==========================================
pub struct ExcelParser;

impl SheetReader for ExcelParser {
    fn read(&self, bytes: &[u8], options: &ReadOptions) -> ImportResult<SheetData> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ImportError::InvalidWorkbook(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        let sheet = resolve_sheet_name(&sheet_names, &options.sheet_name).ok_or_else(|| {
            ImportError::SheetNotFound {
                sheet: options.sheet_name.clone(),
                available: sheet_names.clone(),
            }
        })?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| ImportError::InvalidWorkbook(e.to_string()))?;

        debug!(sheet = %sheet, rows = range.height(), cols = range.width(), "工作表已打开");
        rows_from_range(&range, options)
    }
}

/// 工作表名匹配：先精确匹配，再做空白/大小写宽松匹配
pub fn resolve_sheet_name(available: &[String], wanted: &str) -> Option<String> {
    if let Some(exact) = available.iter().find(|s| s.as_str() == wanted) {
        return Some(exact.clone());
    }
    let wanted_norm = normalize_label(wanted);
    let found = available
        .iter()
        .find(|s| normalize_label(s) == wanted_norm)
        .cloned();
    if let Some(name) = &found {
        warn!(wanted = %wanted, actual = %name, "工作表名宽松匹配");
    }
    found
}

/// 从已打开的区域提取原始行
///
/// - 有表头: 表头行之后的行按表头标签取值，完全空白的行跳过
/// - 无表头: column_names 按位置对应 usecols，空白行保留（供表尾判定）
pub fn rows_from_range(range: &Range<Data>, options: &ReadOptions) -> ImportResult<SheetData> {
    let (start, end) = match (range.start(), range.end()) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            // 空工作表
            return match options.header_row {
                Some(h) => Err(ImportError::HeaderNotFound {
                    sheet: options.sheet_name.clone(),
                    row: options.skip_rows + h + 1,
                }),
                None => Ok(SheetData {
                    columns: options.column_names.iter().map(|c| normalize_label(c)).collect(),
                    rows: Vec::new(),
                }),
            };
        }
    };

    let first_row = (start.0 as usize).max(options.skip_rows);
    let last_row = end.0 as usize;
    let cell = |row: usize, col: usize| -> CellValue {
        range
            .get_value((row as u32, col as u32))
            .map(CellValue::from)
            .unwrap_or(CellValue::Empty)
    };

    match options.header_row {
        Some(h) => {
            let header_abs = first_row + h;
            let columns: Vec<usize> = match &options.usecols {
                Some(cols) => cols.clone(),
                None => (start.1 as usize..=end.1 as usize).collect(),
            };

            let mut headers: Vec<(usize, String)> = Vec::new();
            for &col in &columns {
                let label = normalize_label(&cell(header_abs, col).display());
                if !label.is_empty() && !headers.iter().any(|(_, l)| *l == label) {
                    headers.push((col, label));
                }
            }
            if headers.is_empty() {
                return Err(ImportError::HeaderNotFound {
                    sheet: options.sheet_name.clone(),
                    row: header_abs + 1,
                });
            }

            let mut rows = Vec::new();
            for row in (header_abs + 1)..=last_row {
                let cells: HashMap<String, CellValue> = headers
                    .iter()
                    .map(|(col, label)| (label.clone(), cell(row, *col)))
                    .collect();
                let raw = RawRow {
                    row_index: row + 1,
                    cells,
                };
                if raw.is_blank() {
                    continue;
                }
                rows.push(raw);
            }
            Ok(SheetData {
                columns: headers.into_iter().map(|(_, label)| label).collect(),
                rows,
            })
        }
        None => {
            let columns: Vec<usize> = match &options.usecols {
                Some(cols) => cols.clone(),
                None => (0..options.column_names.len()).collect(),
            };
            if columns.len() != options.column_names.len() {
                return Err(ImportError::ColumnMismatch {
                    sheet: options.sheet_name.clone(),
                    expected: columns.len(),
                    actual: options.column_names.len(),
                });
            }
            let labels: Vec<String> = options.column_names.iter().map(|c| normalize_label(c)).collect();

            let mut rows = Vec::new();
            for row in first_row..=last_row {
                let cells = columns
                    .iter()
                    .zip(labels.iter())
                    .map(|(col, label)| (label.clone(), cell(row, *col)))
                    .collect();
                rows.push(RawRow {
                    row_index: row + 1,
                    cells,
                });
            }
            Ok(SheetData {
                columns: labels,
                rows,
            })
        }
    }
}

/// 表头模式下缺失的必填列（返回布局中声明的列名）
pub fn missing_required_columns(layout: &SheetLayout, sheet: &SheetData) -> Vec<String> {
    layout
        .fields
        .iter()
        .filter(|spec| spec.required)
        .filter(|spec| !spec.candidate_labels().any(|l| sheet.columns.contains(&l)))
        .map(|spec| spec.column.clone())
        .collect()
}

/// 表头模式下缺失的可选列
pub fn missing_optional_columns(layout: &SheetLayout, sheet: &SheetData) -> Vec<String> {
    layout
        .fields
        .iter()
        .filter(|spec| !spec.required)
        .filter(|spec| !spec.candidate_labels().any(|l| sheet.columns.contains(&l)))
        .map(|spec| spec.column.clone())
        .collect()
}
