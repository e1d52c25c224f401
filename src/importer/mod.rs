// ==========================================
// 港口到港舱单系统 - 导入层
// ==========================================
// 职责: 旅客表 / 船员表 → 校验后的舱单聚合
// 支持: .xlsx / .xlsm / .xls / .ods
// ==========================================

// 模块声明
pub mod error;
pub mod field_normalizer;
pub mod file_parser;
pub mod manifest_assembler;
pub mod manifest_importer_impl;
pub mod manifest_importer_trait;
pub mod record_validator;
pub mod sheet_schema;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_normalizer::FieldNormalizer;
pub use file_parser::ExcelParser;
pub use manifest_assembler::{ManifestAssembler, VoyageHeaderForm};
pub use manifest_importer_impl::{ManifestImporterImpl, ManifestPipeline};
pub use record_validator::RecordValidator;
pub use sheet_schema::{FieldKind, FieldSpec, SheetLayout};

// 重导出 Trait 接口
pub use manifest_importer_trait::{CellNormalizer, ManifestImporter, RowValidator, SheetReader};
