// ==========================================
// 港口到港舱单系统 - 用户 API
// ==========================================
// 职责: 管理员建用户 / 用户列表 / 个人资料
// ==========================================

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::hash_password;
use crate::domain::import::UploadedFile;
use crate::domain::types::Role;
use crate::domain::user::{NewUser, User, UserInfo};
use crate::repository::UserRepository;
use crate::storage::FileStore;

/// 用户头像的存储子目录
pub const PHOTO_FILE_CATEGORY: &str = "photos";

/// 新建用户请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// 个人资料更新
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
}

/// 用户API
pub struct UserApi {
    user_repo: Arc<UserRepository>,
    file_store: Arc<dyn FileStore>,
}

impl UserApi {
    pub fn new(user_repo: Arc<UserRepository>, file_store: Arc<dyn FileStore>) -> Self {
        Self {
            user_repo,
            file_store,
        }
    }

    /// 新建用户（管理员）
    ///
    /// # 返回
    /// - Err(ApiError::InvalidInput): 字段缺失 / 角色无效 / 邮箱已注册
    pub async fn create_user(&self, request: CreateUserRequest, photo: Option<UploadedFile>) -> ApiResult<User> {
        let name = request.name.trim();
        let email = request.email.trim().to_lowercase();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("name 不能为空".to_string()));
        }
        if !email.contains('@') {
            return Err(ApiError::InvalidInput(format!("邮箱格式无效: {}", request.email)));
        }
        if request.password.is_empty() {
            return Err(ApiError::InvalidInput("password 不能为空".to_string()));
        }
        let role = Role::parse(&request.role)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知角色: {}", request.role)))?;

        if self.user_repo.find_by_email(&email)?.is_some() {
            return Err(ApiError::InvalidInput(format!("邮箱已注册: {}", email)));
        }

        let photo_url = match photo {
            Some(file) => Some(
                self.file_store
                    .save(PHOTO_FILE_CATEGORY, &file.file_name, &file.bytes)
                    .await?,
            ),
            None => None,
        };

        let user = self.user_repo.create(NewUser {
            name: name.to_string(),
            email,
            password_hash: hash_password(&request.password),
            role,
            photo_url,
        })?;
        info!(user_id = user.id, role = %user.role, "用户已创建");
        Ok(user)
    }

    /// 用户列表（管理员）
    pub fn list_users(&self) -> ApiResult<Vec<UserInfo>> {
        Ok(self
            .user_repo
            .list_all()?
            .into_iter()
            .map(UserInfo::from)
            .collect())
    }

    /// 当前用户资料
    pub fn get_profile(&self, user_id: i64) -> ApiResult<User> {
        self.user_repo
            .find_by_id(user_id)?
            .ok_or_else(|| ApiError::NotFound(format!("用户(id={})不存在", user_id)))
    }

    /// 更新显示名
    pub fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> ApiResult<User> {
        let name = update.name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("name 不能为空".to_string()));
        }
        self.user_repo
            .update_name(user_id, name)?
            .ok_or_else(|| ApiError::NotFound(format!("用户(id={})不存在", user_id)))
    }
}
