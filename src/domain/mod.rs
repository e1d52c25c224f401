// ==========================================
// 港口到港舱单系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod analytics;
pub mod feedback;
pub mod import;
pub mod manifest;
pub mod types;
pub mod user;

// 重导出核心类型
pub use analytics::{
    AgeGenderDistributionStat, DailyTrafficStat, DashboardStats, EnhancedDashboardStats,
    NationalityDistributionStat, RouteComparisonStat, TopNationalityStat,
};
pub use feedback::{Feedback, FeedbackCreate};
pub use import::{
    FieldWarning, ImportOutcome, ImportReport, ManifestUpload, RowPolicy, RowRejected, SheetKind,
    UploadedFile,
};
pub use manifest::{
    Crew, CrewRecord, CrewUpdate, Manifest, NewManifest, Passenger, PassengerRecord,
    VoyageHeader,
};
pub use types::{Role, Sex};
pub use user::{NewUser, User, UserInfo};
