// ==========================================
// 港口到港舱单系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 到港舱单（旅客表 / 船员表）导入与角色化查询服务
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - Excel 舱单解析
pub mod importer;

// 配置层 - 启动配置与运行期配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 认证 - 令牌与口令
pub mod auth;

// 文件留存
pub mod storage;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Role, Sex};

// 领域实体
pub use domain::{
    Crew, DashboardStats, EnhancedDashboardStats, Feedback, ImportReport, Manifest, Passenger,
    User,
};

// API
pub use api::{ApiError, DashboardApi, ManifestApi};

// 导入
pub use importer::{ImportError, ManifestImporter, ManifestPipeline, SheetLayout};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "港口到港舱单系统";
