// ==========================================
// 港口到港舱单系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类:
// - FormatError: 文档不可读 / 工作表缺失 / 列结构不符（致命，整单中止）
// - RowsRejected: 整单模式下的行拒收汇总
// - Persistence: 持久化层错误原样透出
// 单元格级告警与部分模式下的行拒收不走错误通道，见 domain::import
// ==========================================

use crate::domain::import::RowRejected;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文档结构错误（FormatError）=====
    #[error("文件不是有效的电子表格: {0}")]
    InvalidWorkbook(String),

    #[error("工作表不存在: '{sheet}'（可用: {}）", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("工作表 '{sheet}' 第 {row} 行未找到表头")]
    HeaderNotFound { sheet: String, row: usize },

    #[error("工作表 '{sheet}' 缺少必需列: {}", .columns.join(", "))]
    MissingColumns { sheet: String, columns: Vec<String> },

    #[error("工作表 '{sheet}' 列配置不一致: 期望 {expected} 个列名，实际 {actual} 个")]
    ColumnMismatch {
        sheet: String,
        expected: usize,
        actual: usize,
    },

    // ===== 配置错误 =====
    #[error("表格布局配置无效: {0}")]
    InvalidLayout(String),

    // ===== 输入错误 =====
    #[error("航次表头无效: {0}")]
    InvalidHeader(String),

    #[error("未提供任何舱单文件（旅客表或船员表至少一个）")]
    NoDocuments,

    #[error("存在 {} 行数据被拒收: {}", .0.len(), summarize_rejections(.0))]
    RowsRejected(Vec<RowRejected>),

    // ===== 持久化错误 =====
    #[error(transparent)]
    Persistence(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 是否为文档结构类错误
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ImportError::InvalidWorkbook(_)
                | ImportError::SheetNotFound { .. }
                | ImportError::HeaderNotFound { .. }
                | ImportError::MissingColumns { .. }
                | ImportError::ColumnMismatch { .. }
        )
    }
}

fn summarize_rejections(rejections: &[RowRejected]) -> String {
    let mut parts: Vec<String> = rejections.iter().take(5).map(|r| r.to_string()).collect();
    if rejections.len() > 5 {
        parts.push(format!("... 另有 {} 行", rejections.len() - 5));
    }
    parts.join("; ")
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::SheetKind;

    #[test]
    fn test_format_error_classification() {
        assert!(ImportError::InvalidWorkbook("zip".to_string()).is_format_error());
        assert!(ImportError::SheetNotFound {
            sheet: "Form 22".to_string(),
            available: vec!["Sheet1".to_string()],
        }
        .is_format_error());
        assert!(!ImportError::RowsRejected(vec![]).is_format_error());
        assert!(!ImportError::InvalidHeader("ship_name".to_string()).is_format_error());
    }

    #[test]
    fn test_rows_rejected_message_lists_rows() {
        let err = ImportError::RowsRejected(vec![RowRejected {
            sheet: SheetKind::Passenger,
            row_index: 4,
            missing_fields: vec!["passport_no".to_string()],
        }]);
        let msg = err.to_string();
        assert!(msg.contains("1 行"));
        assert!(msg.contains("第 4 行"));
        assert!(msg.contains("passport_no"));
    }

    #[test]
    fn test_sheet_not_found_lists_available() {
        let err = ImportError::SheetNotFound {
            sheet: "Form 22".to_string(),
            available: vec!["Sheet1".to_string(), "Sheet2".to_string()],
        };
        assert!(err.to_string().contains("Sheet1, Sheet2"));
    }
}
