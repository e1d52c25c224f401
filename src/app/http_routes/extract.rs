// ==========================================
// 请求提取器：Bearer 令牌 → 当前用户
// ==========================================

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::error::{ApiError, ApiResult};
use crate::app::state::AppState;
use crate::auth::Claims;
use crate::domain::types::Role;

/// 已认证的当前用户
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.sub
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// 角色守卫
    pub fn require(&self, role: Role) -> ApiResult<()> {
        if self.0.role == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "需要 {} 角色，当前为 {}",
                role, self.0.role
            )))
        }
    }
}

/// 从 Authorization 头取出 Bearer 令牌
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("缺少 Authorization 头".to_string()))?;
        let token = bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Authorization 头格式应为 Bearer <token>".to_string()))?;

        let claims = state.auth_api.authenticate(token)?;
        Ok(CurrentUser(claims))
    }
}

/// 中间件：无有效令牌时直接返回 401（用于静态文件等无处理函数的路由）
pub async fn require_user(_user: CurrentUser, request: Request, next: Next) -> Response {
    next.run(request).await
}
