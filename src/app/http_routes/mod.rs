// ==========================================
// 港口到港舱单系统 - HTTP 路由
// ==========================================
// 职责: axum 路由表、CORS、请求追踪、优雅停机
// 除 /api/login 与 /api/health 外均需 Bearer 令牌（含 /uploads 留存文件）
// ==========================================

pub mod common;
pub mod dashboard;
pub mod extract;
pub mod manifest;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::state::AppState;

pub use common::ErrorResponse;
pub use extract::CurrentUser;

/// 上传请求体上限（两份表格 + 表单字段）
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// 构建路由
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    // 留存文件含旅客身份信息，同样要求登录
    let uploads = Router::new()
        .nest_service("/uploads", ServeDir::new(state.file_store.root()))
        .layer(middleware::from_fn_with_state(state.clone(), extract::require_user));

    Router::new()
        // 认证
        .route("/api/health", get(user::health))
        .route("/api/login", post(user::login))
        // 舱单
        .route("/api/manifests/upload", post(manifest::upload_manifest))
        .route("/api/manifests", get(manifest::list_manifests))
        .route("/api/manifests/:id", get(manifest::get_manifest))
        .route("/api/manifests/:id/import-report", get(manifest::get_import_report))
        .route("/api/crews/:id", put(manifest::update_crew))
        // 看板
        .route("/api/analytics/overview", get(dashboard::analytics_overview))
        .route("/api/analytics/enhanced_dashboard", get(dashboard::enhanced_dashboard))
        // 反馈
        .route("/api/survey", post(dashboard::submit_survey))
        .route("/api/feedback", get(dashboard::list_feedback))
        // 用户
        .route("/api/profile", get(user::get_profile).put(user::update_profile))
        .route("/api/users", get(user::list_users).post(user::create_user))
        // 留存文件
        .merge(uploads)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 启动 HTTP 服务，收到 Ctrl+C / SIGTERM 后优雅退出
pub async fn serve(state: Arc<AppState>, address: &str) -> std::io::Result<()> {
    let app = build_router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "无法监听 Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
