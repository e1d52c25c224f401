// ==========================================
// 港口到港舱单系统 - 舱单组装器
// ==========================================
// 职责: 航次表头 + 旅客记录 + 船员记录 → NewManifest + ImportReport
// 行策略:
// - Partial（默认）: 仅接受通过的行，拒收明细写入报告
// - Atomic: 任一行拒收则整单失败，一次性列出全部拒收行
// ==========================================

use crate::domain::import::{ImportReport, RowPolicy};
use crate::domain::manifest::{NewManifest, VoyageHeader};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::record_validator::SheetOutcome;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

/// 组装结果
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledManifest {
    pub manifest: NewManifest,
    pub report: ImportReport,
}

// ==========================================
// VoyageHeaderForm - 上传表单中的表头字段
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VoyageHeaderForm {
    pub ship_name: Option<String>,
    pub flag: Option<String>,
    pub skipper_name: Option<String>,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 表头日期: YYYY-MM-DD 或 DD/MM/YYYY
fn parse_header_date(field: &str, raw: &str) -> ImportResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| ImportError::InvalidHeader(format!("{} 日期格式无效: '{}'", field, raw)))
}

impl VoyageHeaderForm {
    /// 校验并转换为航次表头（在解析任何表格之前执行）
    pub fn into_header(self) -> ImportResult<VoyageHeader> {
        let mut missing = Vec::new();
        let ship_name = non_blank(&self.ship_name);
        let arrival = non_blank(&self.arrival_date);
        let origin = non_blank(&self.origin);
        let destination = non_blank(&self.destination);

        for (field, value) in [
            ("ship_name", &ship_name),
            ("arrival_date", &arrival),
            ("origin", &origin),
            ("destination", &destination),
        ] {
            if value.is_none() {
                missing.push(field);
            }
        }

        let (Some(ship_name), Some(arrival), Some(origin), Some(destination)) =
            (ship_name, arrival, origin, destination)
        else {
            return Err(ImportError::InvalidHeader(format!(
                "缺少必填字段: {}",
                missing.join(", ")
            )));
        };

        let arrival_date = parse_header_date("arrival_date", &arrival)?;
        let departure_date = match non_blank(&self.departure_date) {
            Some(raw) => Some(parse_header_date("departure_date", &raw)?),
            None => None,
        };

        Ok(VoyageHeader {
            ship_name,
            flag: non_blank(&self.flag),
            skipper_name: non_blank(&self.skipper_name),
            origin,
            destination,
            arrival_date,
            departure_date,
        })
    }
}

// ==========================================
// ManifestAssembler
// ==========================================
pub struct ManifestAssembler {
    policy: RowPolicy,
}

impl ManifestAssembler {
    pub fn new(policy: RowPolicy) -> Self {
        Self { policy }
    }

    /// 组装舱单
    ///
    /// # 参数
    /// - header: 已校验的航次表头
    /// - passengers: 旅客表校验结果（未上传时为空）
    /// - crews: 船员表校验结果（未上传时为空）
    /// - batch_id: 导入批次号
    ///
    /// # 返回
    /// - Ok(AssembledManifest): 记录保持原始行序
    /// - Err(RowsRejected): Atomic 模式下存在拒收行
    pub fn assemble(
        &self,
        header: VoyageHeader,
        passengers: SheetOutcome,
        crews: SheetOutcome,
        batch_id: &str,
    ) -> ImportResult<AssembledManifest> {
        let mut rejected = passengers.rejected;
        rejected.extend(crews.rejected);

        if !rejected.is_empty() {
            match self.policy {
                RowPolicy::Atomic => {
                    warn!(batch_id, rejected = rejected.len(), "整单模式: 存在拒收行，整单中止");
                    return Err(ImportError::RowsRejected(rejected));
                }
                RowPolicy::Partial => {
                    warn!(batch_id, rejected = rejected.len(), "部分接收: 拒收行已跳过");
                }
            }
        }

        let mut warnings = passengers.warnings;
        warnings.extend(crews.warnings);

        let report = ImportReport {
            batch_id: batch_id.to_string(),
            passenger_rows_total: passengers.rows_total,
            passengers_accepted: passengers.passengers.len(),
            crew_rows_total: crews.rows_total,
            crew_accepted: crews.crews.len(),
            rejected,
            warnings,
            elapsed_ms: 0,
        };

        info!(
            batch_id,
            ship = %header.ship_name,
            passengers = report.passengers_accepted,
            crews = report.crew_accepted,
            "舱单组装完成"
        );

        Ok(AssembledManifest {
            manifest: NewManifest {
                header,
                passengers: passengers.passengers,
                crews: crews.crews,
                passenger_file_url: None,
                crew_file_url: None,
                uploaded_by: None,
            },
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::{RowRejected, SheetKind};
    use crate::domain::manifest::{CrewRecord, PassengerRecord};

    fn header() -> VoyageHeader {
        VoyageHeaderForm {
            ship_name: Some("KM KELUD".to_string()),
            arrival_date: Some("2024-03-01".to_string()),
            origin: Some("Batam".to_string()),
            destination: Some("Singapore".to_string()),
            ..Default::default()
        }
        .into_header()
        .unwrap()
    }

    fn passenger(row_index: usize, name: &str) -> PassengerRecord {
        PassengerRecord {
            row_index,
            name: name.to_string(),
            sex: None,
            birth_place: None,
            dob: None,
            nationality: None,
            passport_no: format!("P{}", row_index),
            remarks: None,
        }
    }

    fn crew(row_index: usize, name: &str) -> CrewRecord {
        CrewRecord {
            row_index,
            name: name.to_string(),
            dob: None,
            passport_no: None,
            passport_expiry: None,
            seaman_book_no: None,
            seaman_book_expiry: None,
            rank: None,
        }
    }

    fn outcomes() -> (SheetOutcome, SheetOutcome) {
        let passengers = SheetOutcome {
            rows_total: 4,
            passengers: vec![passenger(2, "A"), passenger(3, "B"), passenger(5, "C")],
            rejected: vec![RowRejected {
                sheet: SheetKind::Passenger,
                row_index: 4,
                missing_fields: vec!["passport_no".to_string()],
            }],
            ..Default::default()
        };
        let crews = SheetOutcome {
            rows_total: 2,
            crews: vec![crew(18, "X"), crew(19, "Y")],
            ..Default::default()
        };
        (passengers, crews)
    }

    #[test]
    fn test_partial_keeps_order_and_reports_rejections() {
        let (p, c) = outcomes();
        let assembled = ManifestAssembler::new(RowPolicy::Partial)
            .assemble(header(), p, c, "batch-1")
            .unwrap();

        let names: Vec<&str> = assembled.manifest.passengers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(assembled.manifest.crews.len(), 2);
        assert_eq!(assembled.report.passenger_rows_total, 4);
        assert_eq!(assembled.report.passengers_accepted, 3);
        assert_eq!(assembled.report.crew_accepted, 2);
        assert_eq!(assembled.report.rejected.len(), 1);
        assert_eq!(assembled.report.batch_id, "batch-1");
    }

    #[test]
    fn test_atomic_fails_with_all_rejections() {
        let (p, c) = outcomes();
        let err = ManifestAssembler::new(RowPolicy::Atomic)
            .assemble(header(), p, c, "batch-2")
            .unwrap_err();
        match err {
            ImportError::RowsRejected(rows) => assert_eq!(rows[0].row_index, 4),
            other => panic!("期望 RowsRejected, 实际 {:?}", other),
        }
    }

    #[test]
    fn test_atomic_passes_clean_batch() {
        let (mut p, c) = outcomes();
        p.rejected.clear();
        assert!(ManifestAssembler::new(RowPolicy::Atomic)
            .assemble(header(), p, c, "batch-3")
            .is_ok());
    }

    #[test]
    fn test_header_form_validation() {
        let err = VoyageHeaderForm {
            ship_name: Some("  ".to_string()),
            origin: Some("Batam".to_string()),
            ..Default::default()
        }
        .into_header()
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ship_name"));
        assert!(msg.contains("arrival_date"));
        assert!(msg.contains("destination"));

        let h = VoyageHeaderForm {
            ship_name: Some("KM KELUD".to_string()),
            arrival_date: Some("01/03/2024".to_string()),
            departure_date: Some("".to_string()),
            origin: Some("Batam".to_string()),
            destination: Some("Singapore".to_string()),
            flag: Some(" ID ".to_string()),
            ..Default::default()
        }
        .into_header()
        .unwrap();
        assert_eq!(h.arrival_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(h.departure_date, None);
        assert_eq!(h.flag.as_deref(), Some("ID"));

        let bad = VoyageHeaderForm {
            departure_date: Some("tomorrow".to_string()),
            ..VoyageHeaderForm {
                ship_name: Some("S".to_string()),
                arrival_date: Some("2024-03-01".to_string()),
                origin: Some("A".to_string()),
                destination: Some("B".to_string()),
                ..Default::default()
            }
        };
        assert!(matches!(bad.into_header(), Err(ImportError::InvalidHeader(_))));
    }
}
