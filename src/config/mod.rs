// ==========================================
// 港口到港舱单系统 - 配置层
// ==========================================
// 职责:
// - server_config: 启动配置（环境变量）
// - config_manager: 运行期导入配置（config_kv 表覆写）
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod server_config;

// 重导出
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::IngestConfigReader;
pub use server_config::{ConfigError, ServerConfig};
