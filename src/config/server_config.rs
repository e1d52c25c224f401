// ==========================================
// 港口到港舱单系统 - 服务启动配置
// ==========================================
// 来源: 环境变量（PORT_MANIFEST_*），缺省值见 load()
// 运行期可调的导入配置不在此处，见 config_manager（config_kv 表）
// ==========================================

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

pub const ENV_PORT: &str = "PORT_MANIFEST_PORT";
pub const ENV_DB_PATH: &str = "PORT_MANIFEST_DB_PATH";
pub const ENV_UPLOAD_DIR: &str = "PORT_MANIFEST_UPLOAD_DIR";
pub const ENV_PUBLIC_BASE_URL: &str = "PORT_MANIFEST_PUBLIC_BASE_URL";
pub const ENV_JWT_SECRET: &str = "PORT_MANIFEST_JWT_SECRET";
pub const ENV_TOKEN_TTL_HOURS: &str = "PORT_MANIFEST_TOKEN_TTL_HOURS";
pub const ENV_ADMIN_PASSWORD: &str = "PORT_MANIFEST_ADMIN_PASSWORD";

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "1234";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("环境变量 {key} 取值无效 '{value}': {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

/// 服务启动配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: String,
    pub upload_dir: PathBuf,
    /// 存储文件对外访问前缀（如 http://localhost:8000/uploads）
    pub public_base_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub admin_password: String,
}

impl ServerConfig {
    /// 从进程环境变量加载
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = try_load(&lookup, ENV_PORT, "8000")?;
        let db_path = lookup(ENV_DB_PATH).unwrap_or_else(default_db_path);
        let upload_dir = PathBuf::from(lookup(ENV_UPLOAD_DIR).unwrap_or_else(|| "./uploads".to_string()));
        let public_base_url = lookup(ENV_PUBLIC_BASE_URL)
            .unwrap_or_else(|| format!("http://localhost:{}/uploads", port))
            .trim_end_matches('/')
            .to_string();
        let token_ttl_hours: i64 = try_load(&lookup, ENV_TOKEN_TTL_HOURS, "12")?;

        let jwt_secret = match lookup(ENV_JWT_SECRET).filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("{ENV_JWT_SECRET} 未设置，使用随机密钥（重启后令牌失效）");
                uuid::Uuid::new_v4().to_string()
            }
        };

        let admin_password = match lookup(ENV_ADMIN_PASSWORD) {
            Some(p) => p,
            None => {
                warn!("{ENV_ADMIN_PASSWORD} 未设置，默认管理员使用缺省口令");
                DEFAULT_ADMIN_PASSWORD.to_string()
            }
        };

        Ok(Self {
            port,
            db_path,
            upload_dir,
            public_base_url,
            jwt_secret,
            token_ttl_hours,
            admin_password,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.clone(),
        message: e.to_string(),
    })
}

/// 默认数据库路径: <数据目录>/port-manifest/port_manifest.db
pub fn default_db_path() -> String {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("port-manifest")
        .join("port_manifest.db")
        .to_string_lossy()
        .to_string()
}
