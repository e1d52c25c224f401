use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::{CreateUserRequest, LoginRequest, LoginResponse, ProfileUpdate};
use crate::app::http_routes::extract::CurrentUser;
use crate::app::http_routes::manifest::{read_file_field, read_text_field};
use crate::app::state::AppState;
use crate::domain::types::Role;
use crate::domain::user::{User, UserInfo};

// ==========================================
// 认证 / 用户 / 个人资料路由
// ==========================================

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(state.auth_api.login(&request)?))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

pub async fn get_profile(State(state): State<Arc<AppState>>, user: CurrentUser) -> ApiResult<Json<User>> {
    Ok(Json(state.user_api.get_profile(user.id())?))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.user_api.update_profile(user.id(), &update)?))
}

/// 新建用户（admin）
///
/// multipart 字段: name, email, password, role, photo
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Json<User>> {
    user.require(Role::Admin)?;

    let mut name = None;
    let mut email = None;
    let mut password = None;
    let mut role = None;
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("multipart 解析失败: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = read_text_field(field).await?,
            "email" => email = read_text_field(field).await?,
            "password" => password = read_text_field(field).await?,
            "role" => role = read_text_field(field).await?,
            "photo" => photo = read_file_field(field).await?,
            other => debug!(field = %other, "忽略未知表单字段"),
        }
    }

    let missing: Vec<&str> = [
        ("name", name.is_none()),
        ("email", email.is_none()),
        ("password", password.is_none()),
        ("role", role.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();
    if !missing.is_empty() {
        return Err(ApiError::InvalidInput(format!("缺少字段: {}", missing.join(", "))));
    }

    let request = CreateUserRequest {
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        password: password.unwrap_or_default(),
        role: role.unwrap_or_default(),
    };
    Ok(Json(state.user_api.create_user(request, photo).await?))
}

/// 用户列表（admin）
pub async fn list_users(State(state): State<Arc<AppState>>, user: CurrentUser) -> ApiResult<Json<Vec<UserInfo>>> {
    user.require(Role::Admin)?;
    Ok(Json(state.user_api.list_users()?))
}
