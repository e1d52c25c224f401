// ==========================================
// 港口到港舱单系统 - 应用层
// ==========================================
// 职责: 共享状态 + HTTP 路由，连接前端与后端
// ==========================================

pub mod http_routes;
pub mod state;

// 重导出
pub use http_routes::{build_router, serve};
pub use state::{get_default_db_path, AppState};
