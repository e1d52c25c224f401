// ==========================================
// 港口到港舱单系统 - 认证 API
// ==========================================
// 职责: 登录签发令牌、令牌校验、默认管理员初始化
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::auth::{hash_password, verify_password, Claims, TokenService};
use crate::config::server_config::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD};
use crate::domain::types::Role;
use crate::domain::user::NewUser;
use crate::repository::UserRepository;

/// 登录请求
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub role: Role,
}

/// 认证API
pub struct AuthApi {
    user_repo: Arc<UserRepository>,
    tokens: TokenService,
}

impl AuthApi {
    pub fn new(user_repo: Arc<UserRepository>, tokens: TokenService) -> Self {
        Self { user_repo, tokens }
    }

    /// 登录
    ///
    /// # 返回
    /// - Ok(LoginResponse): 令牌与角色
    /// - Err(ApiError::Unauthorized): 邮箱或密码错误（不区分两者）
    pub fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let email = request.email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)?
            .filter(|u| verify_password(&request.password, &u.password_hash));

        let Some(user) = user else {
            warn!(email = %email, "登录失败");
            return Err(ApiError::Unauthorized("邮箱或密码错误".to_string()));
        };

        let token = self.tokens.issue(&user)?;
        info!(user_id = user.id, role = %user.role, "登录成功");
        Ok(LoginResponse {
            token,
            token_type: "bearer".to_string(),
            role: user.role,
        })
    }

    /// 校验令牌（用户须仍存在）
    pub fn authenticate(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.tokens.verify(token)?;
        if self.user_repo.find_by_id(claims.sub)?.is_none() {
            return Err(ApiError::Unauthorized("令牌对应的用户不存在".to_string()));
        }
        Ok(claims)
    }

    /// 用户表为空时创建默认管理员
    ///
    /// # 返回
    /// - Ok(true): 已创建
    /// - Ok(false): 已有用户，未做任何事
    pub fn ensure_default_admin(&self, password: &str) -> ApiResult<bool> {
        if self.user_repo.count()? > 0 {
            return Ok(false);
        }
        if password == DEFAULT_ADMIN_PASSWORD {
            warn!(email = DEFAULT_ADMIN_EMAIL, "默认管理员使用出厂密码，请尽快修改");
        }
        self.user_repo.create(NewUser {
            name: "Administrator".to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password_hash: hash_password(password),
            role: Role::Admin,
            photo_url: None,
        })?;
        info!(email = DEFAULT_ADMIN_EMAIL, "已创建默认管理员");
        Ok(true)
    }
}
