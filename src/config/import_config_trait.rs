// ==========================================
// 港口到港舱单系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::import::{RowPolicy, SheetKind};
use crate::importer::sheet_schema::SheetLayout;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// IngestConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait IngestConfigReader: Send + Sync {
    /// 获取表格布局
    ///
    /// # 默认值
    /// - 旅客表: FORMAT_ MANIFEST，第 0 行为表头
    /// - 船员表: Form 22，跳过 17 行，列 [0,1,3,5,6,7]
    ///
    /// 覆写值无法解析或不自洽时回退默认值
    async fn get_sheet_layout(&self, kind: SheetKind) -> RepositoryResult<SheetLayout>;

    /// 获取行级策略
    ///
    /// # 默认值
    /// - Partial
    async fn get_row_policy(&self) -> RepositoryResult<RowPolicy>;
}
