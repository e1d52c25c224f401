// ==========================================
// 港口到港舱单系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod analytics_repo;
pub mod error;
pub mod feedback_repo;
pub mod manifest_repo;
pub mod manifest_repo_impl;
pub mod user_repo;

// 重导出核心仓储
pub use analytics_repo::AnalyticsRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use feedback_repo::FeedbackRepository;
pub use manifest_repo::ManifestRepository;
pub use manifest_repo_impl::ManifestRepositoryImpl;
pub use user_repo::UserRepository;
