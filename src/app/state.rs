// ==========================================
// 港口到港舱单系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{AuthApi, DashboardApi, FeedbackApi, ManifestApi, UserApi};
use crate::auth::TokenService;
use crate::config::{ConfigManager, ServerConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::{ManifestImporterImpl, ManifestPipeline};
use crate::repository::{
    AnalyticsRepository, FeedbackRepository, ManifestRepositoryImpl, UserRepository,
};
use crate::storage::{FileStore, LocalFileStore};

/// 应用状态
///
/// 包含所有API实例和共享资源
/// 作为 axum 的 State 在路由间共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 舱单API（上传 / 查询 / 补录）
    pub manifest_api: Arc<ManifestApi>,

    /// 认证API
    pub auth_api: Arc<AuthApi>,

    /// 用户API
    pub user_api: Arc<UserApi>,

    /// 满意度反馈API
    pub feedback_api: Arc<FeedbackApi>,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 运行期导入配置
    pub config_manager: Arc<ConfigManager>,

    /// 文件留存（上传目录由 /uploads 静态暴露）
    pub file_store: Arc<LocalFileStore>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化表结构
    /// 2. 初始化所有Repository与导入管道
    /// 3. 用户表为空时写入默认管理员
    pub fn new(config: &ServerConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", config.db_path);

        let conn = open_sqlite_connection(&config.db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::from_connection(Arc::new(Mutex::new(conn)), config)
    }

    /// 从已有连接创建（测试使用内存库）
    pub fn from_connection(conn: Arc<Mutex<Connection>>, config: &ServerConfig) -> Result<Self, String> {
        {
            let guard = conn.lock().map_err(|e| format!("数据库锁获取失败: {}", e))?;
            init_schema(&guard).map_err(|e| format!("数据库表结构初始化失败: {}", e))?;
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let user_repo = Arc::new(UserRepository::from_connection(conn.clone()));
        let feedback_repo = Arc::new(FeedbackRepository::from_connection(conn.clone()));
        let analytics_repo = Arc::new(AnalyticsRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));

        let file_store = Arc::new(LocalFileStore::new(
            config.upload_dir.clone(),
            &config.public_base_url,
        ));
        let shared_store: Arc<dyn FileStore> = file_store.clone();

        // ==========================================
        // 初始化导入管道
        // ==========================================
        let importer = ManifestImporterImpl::new(
            ManifestRepositoryImpl::from_connection(conn.clone()),
            ConfigManager::from_connection(conn.clone()),
            shared_store.clone(),
            ManifestPipeline::default(),
        );

        // ==========================================
        // 创建API实例
        // ==========================================
        let manifest_api = Arc::new(ManifestApi::new(
            Arc::new(importer),
            Arc::new(ManifestRepositoryImpl::from_connection(conn.clone())),
        ));
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);
        let auth_api = Arc::new(AuthApi::new(user_repo.clone(), tokens));
        let user_api = Arc::new(UserApi::new(user_repo, shared_store));
        let feedback_api = Arc::new(FeedbackApi::new(feedback_repo));
        let dashboard_api = Arc::new(DashboardApi::new(analytics_repo));

        auth_api
            .ensure_default_admin(&config.admin_password)
            .map_err(|e| format!("默认管理员初始化失败: {}", e))?;

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path: config.db_path.clone(),
            manifest_api,
            auth_api,
            user_api,
            feedback_api,
            dashboard_api,
            config_manager,
            file_store,
        })
    }
}

/// 获取默认数据库路径
///
/// 使用平台数据目录（dirs），失败时回退到当前目录
pub fn get_default_db_path() -> String {
    crate::config::server_config::default_db_path()
}
