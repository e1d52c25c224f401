// ==========================================
// 港口到港舱单系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 路由调用
// 不依赖 Web 框架；HTTP 映射在 app::http_routes
// ==========================================

pub mod auth_api;
pub mod dashboard_api;
pub mod error;
pub mod feedback_api;
pub mod manifest_api;
pub mod user_api;

// 重导出核心类型
pub use auth_api::{AuthApi, LoginRequest, LoginResponse};
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use feedback_api::FeedbackApi;
pub use manifest_api::ManifestApi;
pub use user_api::{CreateUserRequest, ProfileUpdate, UserApi};
