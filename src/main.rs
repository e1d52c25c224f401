// ==========================================
// 港口到港舱单系统 - 服务主入口
// ==========================================
// 启动顺序: 日志 → 环境配置 → AppState（建表 / 默认管理员）→ HTTP 服务
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use port_manifest::app::{serve, AppState};
use port_manifest::config::ServerConfig;
use port_manifest::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", port_manifest::APP_NAME);
    tracing::info!("系统版本: {}", port_manifest::VERSION);
    tracing::info!("==================================================");

    let config = ServerConfig::load().context("读取环境配置失败")?;
    tracing::info!(db_path = %config.db_path, upload_dir = %config.upload_dir.display(), "配置已加载");

    std::fs::create_dir_all(&config.upload_dir)
        .with_context(|| format!("无法创建上传目录 {}", config.upload_dir.display()))?;

    let state = AppState::new(&config)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    serve(Arc::new(state), &config.bind_address())
        .await
        .context("HTTP 服务异常退出")?;

    tracing::info!("服务已退出");
    Ok(())
}
