// ==========================================
// 港口到港舱单系统 - 舱单导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 阶段: 读取 → 标准化 → 校验 → 组装 → 落库
// ==========================================

use crate::domain::import::{FieldWarning, ImportOutcome, ManifestUpload, SheetKind};
use crate::importer::error::ImportResult;
use crate::importer::field_normalizer::{NormalizedRow, NormalizedValue};
use crate::importer::file_parser::{CellValue, ReadOptions, SheetData};
use crate::importer::record_validator::RowOutcome;
use crate::importer::sheet_schema::{FieldSpec, SheetLayout};
use async_trait::async_trait;

// ==========================================
// ManifestImporter Trait
// ==========================================
// 用途: 舱单导入主接口
// 实现者: ManifestImporterImpl
#[async_trait]
pub trait ManifestImporter: Send + Sync {
    /// 导入一次上传（表头 + 一或两份表格）
    ///
    /// # 参数
    /// - upload: 航次表头与原始文件
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 已落库舱单 + 导入报告
    /// - Err: 文档结构错误 / 整单模式下的行拒收 / 持久化错误
    async fn import(&self, upload: ManifestUpload) -> ImportResult<ImportOutcome>;
}

// ==========================================
// SheetReader Trait
// ==========================================
// 用途: 电子表格读取（阶段 0）
// 实现者: ExcelParser
pub trait SheetReader: Send + Sync {
    /// 从字节流读取指定工作表
    ///
    /// # 返回
    /// - Ok(SheetData): 列名 + 原始行（带 Excel 行号）
    /// - Err: InvalidWorkbook / SheetNotFound / HeaderNotFound / ColumnMismatch
    fn read(&self, bytes: &[u8], options: &ReadOptions) -> ImportResult<SheetData>;
}

// ==========================================
// CellNormalizer Trait
// ==========================================
// 用途: 单元格标准化（阶段 1），永不失败
// 实现者: FieldNormalizer
pub trait CellNormalizer: Send + Sync {
    /// 按字段类型标准化一个单元格
    ///
    /// # 返回
    /// - (值, 可选告警)：无法解析时值为 Null 并附告警
    fn normalize(
        &self,
        sheet: SheetKind,
        row_index: usize,
        spec: &FieldSpec,
        cell: &CellValue,
    ) -> (NormalizedValue, Option<FieldWarning>);
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 行级必填校验（阶段 2）
// 实现者: RecordValidator
pub trait RowValidator: Send + Sync {
    /// 校验一行
    ///
    /// # 返回
    /// - Accepted: 必填字段齐全
    /// - Rejected: 缺失字段列表
    /// - EndOfTable: 表尾判定字段为空（停止读取，非错误）
    fn validate(&self, layout: &SheetLayout, row: &NormalizedRow) -> RowOutcome;
}
