// ==========================================
// 港口到港舱单系统 - 行记录校验器
// ==========================================
// 职责: 必填字段校验 / 表尾判定 / 同表护照号重复检查
// 表尾规则: 声明了 terminator 的表，首个 terminator 为空的行即表尾，
//           停止读取（不是拒收）
// ==========================================

use crate::domain::import::{FieldWarning, RowRejected, SheetKind};
use crate::domain::manifest::{CrewRecord, PassengerRecord};
use crate::importer::field_normalizer::{is_sentinel_empty, FieldNormalizer, NormalizedRow};
use crate::importer::file_parser::{RawRow, SheetData};
use crate::importer::manifest_importer_trait::RowValidator;
use crate::importer::sheet_schema::{FieldKind, SheetLayout};
use std::collections::HashSet;
use tracing::{debug, info};

pub const REASON_DUPLICATE_PASSPORT: &str = "duplicate_passport_no";

/// 校验通过的类型化记录
#[derive(Debug, Clone, PartialEq)]
pub enum ValidRecord {
    Passenger(PassengerRecord),
    Crew(CrewRecord),
}

/// 单行校验结果
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(ValidRecord),
    Rejected(RowRejected),
    EndOfTable,
}

/// 整张表的校验结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetOutcome {
    /// 参与校验的行数（表尾之前）
    pub rows_total: usize,
    pub passengers: Vec<PassengerRecord>,
    pub crews: Vec<CrewRecord>,
    pub rejected: Vec<RowRejected>,
    pub warnings: Vec<FieldWarning>,
}

pub struct RecordValidator;

impl RecordValidator {
    fn missing_fields(&self, layout: &SheetLayout, row: &NormalizedRow) -> Vec<String> {
        layout
            .fields
            .iter()
            .filter(|spec| spec.required && row.get(&spec.field).is_null())
            .map(|spec| spec.field.clone())
            .collect()
    }

    /// 布局声明的数据列全部为空（序号列不计，表格常预先编号）
    fn is_blank_record(&self, layout: &SheetLayout, raw: &RawRow) -> bool {
        layout
            .fields
            .iter()
            .filter(|spec| !matches!(spec.kind, FieldKind::Ordinal))
            .all(|spec| is_sentinel_empty(raw.get(spec.candidate_labels())))
    }

    fn rejected(&self, sheet: SheetKind, row_index: usize, missing_fields: Vec<String>) -> RowOutcome {
        RowOutcome::Rejected(RowRejected {
            sheet,
            row_index,
            missing_fields,
        })
    }

    /// 校验整张表
    ///
    /// # 参数
    /// - layout: 表格布局
    /// - sheet: 读取器产出的原始行
    /// - normalizer: 字段标准化器
    ///
    /// # 返回
    /// - SheetOutcome: 接受记录（保持原始行序）+ 拒收 + 告警
    pub fn validate_sheet(
        &self,
        layout: &SheetLayout,
        sheet: &SheetData,
        normalizer: &FieldNormalizer,
    ) -> SheetOutcome {
        let mut outcome = SheetOutcome::default();
        let mut seen_passports = HashSet::new();

        for raw in &sheet.rows {
            if layout.terminator.is_none() && self.is_blank_record(layout, raw) {
                continue;
            }

            let (row, warnings) = normalizer.normalize_row(layout, raw);
            match self.validate(layout, &row) {
                RowOutcome::EndOfTable => {
                    debug!(sheet = %layout.kind, row_index = raw.row_index, "到达表尾");
                    break;
                }
                RowOutcome::Rejected(rejection) => {
                    outcome.rows_total += 1;
                    outcome.warnings.extend(warnings);
                    outcome.rejected.push(rejection);
                }
                RowOutcome::Accepted(record) => {
                    outcome.rows_total += 1;
                    outcome.warnings.extend(warnings);
                    match record {
                        ValidRecord::Passenger(p) => {
                            // 同批次内护照号重复（告警，不拒收）
                            if !seen_passports.insert(p.passport_no.clone()) {
                                outcome.warnings.push(FieldWarning {
                                    sheet: SheetKind::Passenger,
                                    row_index: p.row_index,
                                    field: "passport_no".to_string(),
                                    raw_value: p.passport_no.clone(),
                                    reason: REASON_DUPLICATE_PASSPORT.to_string(),
                                });
                            }
                            outcome.passengers.push(p);
                        }
                        ValidRecord::Crew(c) => outcome.crews.push(c),
                    }
                }
            }
        }

        info!(
            sheet = %layout.kind,
            rows_total = outcome.rows_total,
            accepted = outcome.passengers.len() + outcome.crews.len(),
            rejected = outcome.rejected.len(),
            warnings = outcome.warnings.len(),
            "表格校验完成"
        );
        outcome
    }
}

impl RowValidator for RecordValidator {
    fn validate(&self, layout: &SheetLayout, row: &NormalizedRow) -> RowOutcome {
        if let Some(terminator) = &layout.terminator {
            if row.get(terminator).is_null() {
                return RowOutcome::EndOfTable;
            }
        }

        let missing = self.missing_fields(layout, row);
        if !missing.is_empty() {
            return self.rejected(layout.kind, row.row_index, missing);
        }

        match layout.kind {
            SheetKind::Passenger => {
                let (Some(name), Some(passport_no)) = (row.text("name"), row.text("passport_no")) else {
                    let missing = ["name", "passport_no"]
                        .iter()
                        .filter(|f| row.get(f).is_null())
                        .map(|f| f.to_string())
                        .collect();
                    return self.rejected(layout.kind, row.row_index, missing);
                };
                RowOutcome::Accepted(ValidRecord::Passenger(PassengerRecord {
                    row_index: row.row_index,
                    name,
                    sex: row.text("sex"),
                    birth_place: row.text("birth_place"),
                    dob: row.date("dob"),
                    nationality: row.text("nationality"),
                    passport_no,
                    remarks: row.text("remarks"),
                }))
            }
            SheetKind::Crew => {
                let Some(name) = row.text("name") else {
                    return self.rejected(layout.kind, row.row_index, vec!["name".to_string()]);
                };
                RowOutcome::Accepted(ValidRecord::Crew(CrewRecord {
                    row_index: row.row_index,
                    name,
                    dob: row.date("dob"),
                    passport_no: row.text("passport_no"),
                    passport_expiry: row.date("passport_expiry"),
                    seaman_book_no: row.text("seaman_book_no"),
                    seaman_book_expiry: row.date("seaman_book_expiry"),
                    rank: row.text("rank"),
                }))
            }
        }
    }
}
