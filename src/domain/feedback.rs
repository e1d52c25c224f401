// ==========================================
// 港口到港舱单系统 - 满意度反馈
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 已提交的反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub rating: i32,
    pub comments: Option<String>,
    pub role: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 反馈提交请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackCreate {
    pub rating: i32,
    pub comments: Option<String>,
    pub role: String,
}
