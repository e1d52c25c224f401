// ==========================================
// 港口到港舱单系统 - 看板 API
// ==========================================
// 职责: 概览统计与增强看板（只读聚合）
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::analytics::{DashboardStats, EnhancedDashboardStats};
use crate::repository::AnalyticsRepository;

/// 看板API
pub struct DashboardApi {
    analytics_repo: Arc<AnalyticsRepository>,
}

impl DashboardApi {
    pub fn new(analytics_repo: Arc<AnalyticsRepository>) -> Self {
        Self { analytics_repo }
    }

    /// 概览：舱单数 / 旅客数 / 性别 / 平均载客 / 最多国籍
    pub fn overview(&self) -> ApiResult<DashboardStats> {
        Ok(self.analytics_repo.overview()?)
    }

    /// 增强看板：每日流量 / 航线对比 / 国籍分布 / 年龄段×性别
    pub fn enhanced_dashboard(&self) -> ApiResult<EnhancedDashboardStats> {
        Ok(self.analytics_repo.enhanced()?)
    }
}
