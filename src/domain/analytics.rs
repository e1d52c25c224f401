// ==========================================
// 港口到港舱单系统 - 驾驶舱统计模型
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNationalityStat {
    pub nationality: String,
    pub count: i64,
}

impl Default for TopNationalityStat {
    fn default() -> Self {
        Self {
            nationality: "N/A".to_string(),
            count: 0,
        }
    }
}

/// 概览统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_manifests: i64,
    pub total_passengers: i64,
    pub male_passengers: i64,
    pub female_passengers: i64,
    pub avg_passengers_per_manifest: f64,
    pub top_nationality: TopNationalityStat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrafficStat {
    pub date: String,
    pub passenger_count: i64,
    pub manifest_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteComparisonStat {
    pub route: String,
    pub passenger_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalityDistributionStat {
    pub nationality: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGenderDistributionStat {
    pub age_group: String,
    pub male_count: i64,
    pub female_count: i64,
}

/// 增强驾驶舱统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedDashboardStats {
    pub daily_traffic: Vec<DailyTrafficStat>,
    pub route_comparison: Vec<RouteComparisonStat>,
    pub nationality_distribution: Vec<NationalityDistributionStat>,
    pub age_gender_distribution: Vec<AgeGenderDistributionStat>,
}

/// 年龄分组边界（含上界）
pub const AGE_GROUPS: [(&str, u32, u32); 5] = [
    ("0-17", 0, 17),
    ("18-30", 18, 30),
    ("31-45", 31, 45),
    ("46-60", 46, 60),
    ("60+", 61, u32::MAX),
];

/// 按年龄返回分组标签
pub fn age_group_label(age: u32) -> &'static str {
    AGE_GROUPS
        .iter()
        .find(|(_, lo, hi)| age >= *lo && age <= *hi)
        .map(|(label, _, _)| *label)
        .unwrap_or("60+")
}

/// 周岁（on 早于 dob 时返回 None）
pub fn age_on(dob: NaiveDate, on: NaiveDate) -> Option<u32> {
    let mut years = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// 平均值保留 1 位小数（分母为 0 时为 0.0）
pub fn round_avg(total: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    (total as f64 / count as f64 * 10.0).round() / 10.0
}
