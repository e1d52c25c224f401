// ==========================================
// 港口到港舱单系统 - 舱单 Repository Trait
// ==========================================
// 职责: 定义舱单相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::ImportReport;
use crate::domain::manifest::{Crew, CrewUpdate, Manifest, NewManifest};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ManifestRepository Trait
// ==========================================
// 用途: 舱单持久化网关
// 实现者: ManifestRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ManifestRepository: Send + Sync {
    /// 插入舱单 + 旅客 + 船员 + 导入报告（单事务）
    ///
    /// # 返回
    /// - Ok(i64): 新舱单 id
    /// - Err: 数据库错误（整个事务回滚）
    async fn insert_manifest(&self, manifest: NewManifest, report: &ImportReport) -> RepositoryResult<i64>;

    /// 分页查询舱单（含旅客与船员，按 id 升序）
    async fn list_manifests(&self, skip: i64, limit: i64) -> RepositoryResult<Vec<Manifest>>;

    /// 按 id 查询舱单
    async fn find_manifest(&self, id: i64) -> RepositoryResult<Option<Manifest>>;

    /// 补录船员证件
    ///
    /// # 返回
    /// - Ok(Some(Crew)): 更新后的记录
    /// - Ok(None): 船员不存在
    async fn update_crew(&self, crew_id: i64, update: CrewUpdate) -> RepositoryResult<Option<Crew>>;

    /// 查询舱单的导入报告
    async fn find_import_report(&self, manifest_id: i64) -> RepositoryResult<Option<ImportReport>>;
}
