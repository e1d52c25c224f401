use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use crate::api::error::ApiResult;
use crate::app::http_routes::common::PageQuery;
use crate::app::http_routes::extract::CurrentUser;
use crate::app::state::AppState;
use crate::domain::analytics::{DashboardStats, EnhancedDashboardStats};
use crate::domain::feedback::{Feedback, FeedbackCreate};
use crate::domain::types::Role;

// ==========================================
// 看板与满意度反馈路由
// ==========================================

pub async fn analytics_overview(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.dashboard_api.overview()?))
}

pub async fn enhanced_dashboard(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> ApiResult<Json<EnhancedDashboardStats>> {
    Ok(Json(state.dashboard_api.enhanced_dashboard()?))
}

pub async fn submit_survey(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(feedback): Json<FeedbackCreate>,
) -> ApiResult<Json<Feedback>> {
    Ok(Json(state.feedback_api.submit(feedback, Some(user.id()))?))
}

/// 反馈列表（admin）
pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<Feedback>>> {
    user.require(Role::Admin)?;
    Ok(Json(state.feedback_api.list(page.skip, page.limit)?))
}
