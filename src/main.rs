use grocergate::AppError;
use grocergate::config::{AppConfig, args, init_config};
use grocergate::runtime::{listen_for_shutdown, prepare_server, run_server};
use grocergate::security::PasswordManager;
use grocergate::system::install_panic_hook;
use std::env;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // 安装 panic hook
    install_panic_hook();

    // 解析命令行参数
    let cli_args: Vec<String> = env::args().collect();
    let command = args::parse_command(&cli_args).map_err(AppError::BadRequest)?;

    match command {
        args::Command::HashPassword(password) => {
            println!("{}", PasswordManager::hash_password(&password));
            return Ok(());
        }
        args::Command::SampleConfig => {
            print!("{}", AppConfig::generate_sample_config());
            return Ok(());
        }
        args::Command::Serve => {}
    }

    // 初始化全局配置
    let config = init_config(args::parse_config_path(&cli_args)).clone();

    // 初始化服务器
    let ctx = prepare_server(config).await?;

    tracing::info!("GrocerGate is ready");

    // 启动 HTTP 服务器和优雅关闭监听
    tokio::select! {
        result = run_server(ctx) => {
            result.map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;
        }
        _ = listen_for_shutdown() => {
            tracing::info!("收到关闭信号，正在停止服务器...");
        }
    }

    Ok(())
}
