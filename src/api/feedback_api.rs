// ==========================================
// 港口到港舱单系统 - 满意度反馈 API
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::manifest_api::validate_page;
use crate::domain::feedback::{Feedback, FeedbackCreate};
use crate::repository::FeedbackRepository;

/// 评分范围
pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

pub struct FeedbackApi {
    feedback_repo: Arc<FeedbackRepository>,
}

impl FeedbackApi {
    pub fn new(feedback_repo: Arc<FeedbackRepository>) -> Self {
        Self { feedback_repo }
    }

    /// 提交反馈
    ///
    /// # 参数
    /// - feedback: 评分 / 意见 / 填写人角色
    /// - user_id: 当前用户
    ///
    /// # 返回
    /// - Err(ApiError::ValidationError): 评分不在 1..=5
    pub fn submit(&self, feedback: FeedbackCreate, user_id: Option<i64>) -> ApiResult<Feedback> {
        if !RATING_RANGE.contains(&feedback.rating) {
            return Err(ApiError::ValidationError(format!(
                "rating 必须在 1..=5 之间: {}",
                feedback.rating
            )));
        }
        let feedback = FeedbackCreate {
            comments: feedback
                .comments
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            role: feedback.role.trim().to_string(),
            ..feedback
        };

        let saved = self.feedback_repo.insert(&feedback, user_id)?;
        info!(feedback_id = saved.id, rating = saved.rating, "反馈已提交");
        Ok(saved)
    }

    /// 反馈列表（管理员）
    pub fn list(&self, skip: Option<i64>, limit: Option<i64>) -> ApiResult<Vec<Feedback>> {
        let (skip, limit) = validate_page(skip, limit)?;
        Ok(self.feedback_repo.list(skip, limit)?)
    }
}
