use actix_web::web;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::{AppConfig, SeedConfig, get_config_path};
use crate::errors::AppError;
use crate::security::{JwtManager, KeySource, LiveKeySource, PasswordManager, SigningMaterial};
use crate::storage::{MemoryUserStore, NewUser, Role, UserRepository};

/// 服务器启动上下文
pub struct StartupContext {
    pub storage: Arc<dyn UserRepository>,
    pub jwt_manager: Arc<JwtManager>,
    pub config: AppConfig,
    _log_guard: Option<WorkerGuard>,
}

/// 初始化服务器
pub async fn prepare_server(config: AppConfig) -> Result<StartupContext, AppError> {
    // 1. 初始化日志
    let log_guard = crate::system::init_logging(&config.log);
    tracing::info!("GrocerGate v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = get_config_path() {
        tracing::info!("Using config file: {}", path);
    }

    // 2. 检查配置，问题只告警不中断
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    // 3. 初始化存储
    let storage: Arc<dyn UserRepository> = Arc::new(MemoryUserStore::new());
    seed_admin(storage.as_ref(), &config.seed).await?;

    // 4. 初始化 JWT 管理器（每次调用读取当前密钥）
    let keys = LiveKeySource::new(config.auth.clone());
    let algorithm = SigningMaterial::resolve(&keys.signing_settings()).algorithm();
    let jwt_manager = Arc::new(JwtManager::new(Arc::new(keys)));
    tracing::info!(
        algorithm,
        lifetime_secs = jwt_manager.lifetime_secs(),
        "JWT manager initialized"
    );

    tracing::info!("Server initialization complete");

    Ok(StartupContext {
        storage,
        jwt_manager,
        config,
        _log_guard: log_guard,
    })
}

/// 按配置写入初始管理员，已存在则跳过
async fn seed_admin(storage: &dyn UserRepository, seed: &SeedConfig) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (seed.admin_email.clone(), seed.admin_password.clone())
    else {
        tracing::debug!("No admin seed configured");
        return Ok(());
    };

    if storage.find_by_email(&email).await?.is_some() {
        tracing::info!("Admin account already present, skipping seed");
        return Ok(());
    }

    let password_hash = web::block(move || PasswordManager::hash_password(&password)).await?;
    let admin = storage
        .create(NewUser {
            email,
            name: seed.admin_name.clone().unwrap_or_else(|| "Administrator".to_string()),
            role: Role::Admin,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %admin.id, "Admin account seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(email: Option<&str>, password: Option<&str>) -> SeedConfig {
        SeedConfig {
            admin_email: email.map(str::to_string),
            admin_password: password.map(str::to_string),
            admin_name: None,
        }
    }

    #[actix_web::test]
    async fn test_seed_admin_creates_verifiable_account() {
        let storage = MemoryUserStore::new();
        seed_admin(&storage, &seed(Some("admin@grocer.test"), Some("admin")))
            .await
            .unwrap();

        let admin = storage
            .find_by_email("admin@grocer.test")
            .await
            .unwrap()
            .expect("admin seeded");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.name, "Administrator");
        assert!(PasswordManager::verify_password("admin", &admin.password_hash));
    }

    #[actix_web::test]
    async fn test_seed_admin_is_idempotent() {
        let storage = MemoryUserStore::new();
        let config = seed(Some("admin@grocer.test"), Some("admin"));
        seed_admin(&storage, &config).await.unwrap();
        seed_admin(&storage, &config).await.unwrap();

        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_seed_admin_skips_incomplete_seed() {
        let storage = MemoryUserStore::new();
        seed_admin(&storage, &seed(Some("admin@grocer.test"), None))
            .await
            .unwrap();

        assert!(storage.list().await.unwrap().is_empty());
    }
}
