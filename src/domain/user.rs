// ==========================================
// 港口到港舱单系统 - 用户领域模型
// ==========================================

use crate::domain::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 系统用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 用户列表视图（管理员）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub photo_url: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            email: user.email,
            role: user.role,
            photo_url: user.photo_url,
        }
    }
}

/// 新建用户（password_hash 已计算）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub photo_url: Option<String>,
}
