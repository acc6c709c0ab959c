use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// 初始化日志
///
/// 配置了 `file` 时额外写入文件，返回的 guard 需在进程存活期间持有。
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = match config.file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path, config));
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    let result = match config.format.as_str() {
        "json" => registry.with(fmt::layer().json()).try_init(),
        // pretty format (default)
        _ => registry.with(fmt::layer().pretty()).try_init(),
    };

    if let Err(e) = result {
        eprintln!("[WARN] 日志系统已初始化: {}", e);
    }

    tracing::info!("Logging initialized with level: {}", config.level);
    guard
}

fn file_appender(path: &str, config: &LogConfig) -> RollingFileAppender {
    let path = Path::new(path);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("grocergate.log");

    if !config.enable_rotation {
        return rolling::never(directory, file_name);
    }

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .max_log_files(config.max_backups.max(1) as usize)
        .build(directory)
        .unwrap_or_else(|e| {
            eprintln!("[WARN] 日志轮转初始化失败，改为单文件: {}", e);
            rolling::never(directory, file_name)
        })
}
