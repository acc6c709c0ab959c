use tokio::signal;
use tracing::{error, warn};

/// 监听关闭信号
pub async fn listen_for_shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("收到关闭信号，即将关闭...");
}
