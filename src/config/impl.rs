use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use super::AppConfig;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();
static CONFIG_PATH: OnceLock<String> = OnceLock::new();

impl AppConfig {
    /// 从文件加载配置,支持环境变量覆盖
    ///
    /// # 参数
    /// * `config_path` - 可选的配置文件路径
    ///   - `Some(path)`: 使用指定文件（不存在则创建）
    ///   - `None`: 使用默认 "config.toml"（不存在则警告）
    pub fn load(config_path: Option<&str>) -> Self {
        let mut config = Self::load_from_file(config_path);
        config.override_with_env();
        config
    }

    /// 从 TOML 文件加载配置
    fn load_from_file(config_path: Option<&str>) -> Self {
        let path = config_path.unwrap_or("config.toml");

        if !Path::new(path).exists() {
            if config_path.is_some() {
                eprintln!("[WARN] 配置文件不存在: {}", path);
                eprintln!("[WARN] 正在创建默认配置文件...");
                if let Err(e) = Self::ensure_config_file(path) {
                    eprintln!("[ERROR] 创建配置文件失败 {}: {}", path, e);
                    eprintln!("[WARN] 使用内存默认配置");
                    return Self::default();
                }
                eprintln!("[INFO] 配置文件已创建: {}", path);
            } else {
                eprintln!("[WARN] 未找到配置文件: {}", path);
                eprintln!("[WARN] 使用内存默认配置");
                eprintln!("[HINT] 使用 -c/--config 指定自定义配置文件");
                return Self::default();
            }
        }

        match fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => {
                    eprintln!("[INFO] 配置已从文件加载: {}", path);
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] 解析配置文件失败 {}: {}", path, e);
                    eprintln!("[WARN] 使用内存默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] 读取配置文件失败 {}: {}", path, e);
                eprintln!("[WARN] 使用内存默认配置");
                Self::default()
            }
        }
    }

    /// 解析 TOML 文本
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<AppConfig>(content)
    }

    /// 确保配置文件存在,不存在则创建默认值
    fn ensure_config_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = Self::generate_sample_config();

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// 用环境变量覆盖配置
    fn override_with_env(&mut self) {
        self.override_with(|name| env::var(name).ok());
    }

    fn override_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // 服务器配置
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        parse_into(&lookup, "SERVER_PORT", &mut self.server.port);

        // 认证配置
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(key) = lookup("JWT_PRIVATE_KEY") {
            self.auth.jwt_private_key = Some(key);
        }
        if let Some(key) = lookup("JWT_PUBLIC_KEY") {
            self.auth.jwt_public_key = Some(key);
        }
        if let Some(expires_in) = lookup("JWT_EXPIRES_IN") {
            self.auth.jwt_expires_in = expires_in;
        }
        if let Some(name) = lookup("AUTH_COOKIE_NAME") {
            self.auth.cookie_name = name;
        }
        if let Some(secure) = lookup("AUTH_COOKIE_SECURE") {
            self.auth.cookie_secure = is_truthy(&secure);
        }

        // 初始管理员
        if let Some(email) = lookup("ADMIN_EMAIL") {
            self.seed.admin_email = Some(email);
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.seed.admin_password = Some(password);
        }
        if let Some(name) = lookup("ADMIN_NAME") {
            self.seed.admin_name = Some(name);
        }

        // 日志配置
        if let Some(level) = lookup("RUST_LOG") {
            self.log.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.log.format = format;
        }
        if let Some(file) = lookup("LOG_FILE") {
            self.log.file = Some(file);
        }
        if let Some(enable) = lookup("LOG_ENABLE_ROTATION") {
            self.log.enable_rotation = is_truthy(&enable);
        }
        parse_into(&lookup, "LOG_MAX_BACKUPS", &mut self.log.max_backups);
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = AppConfig::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("生成配置示例出错: {}", e))
    }

    /// 检查签名配置，返回需要提示运维的警告
    ///
    /// 弱配置只告警不拒绝启动，是否收紧由部署方决定。
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let has_private = has_value(&self.auth.jwt_private_key);
        let has_public = has_value(&self.auth.jwt_public_key);

        if has_private != has_public {
            warnings.push(
                "Only one half of the RSA key pair is configured; falling back to HS256".to_string(),
            );
        }

        if !(has_private && has_public) {
            let secret = self.auth.jwt_secret.trim();
            if secret.is_empty() {
                warnings.push("JWT secret is empty; tokens are signed with an empty HMAC key".to_string());
            } else if secret.len() < 32 {
                warnings.push("JWT secret is shorter than 32 characters".to_string());
            }
        }

        if self.auth.min_password_length == 0 {
            warnings.push("min_password_length is 0; empty passwords are accepted".to_string());
        }

        warnings
    }
}

fn parse_into<F, T>(lookup: &F, name: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(name) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => eprintln!("[ERROR] 无效的 {}: {}", name, raw),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1"
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// ============ 全局配置实例 ============

/// 初始化全局配置
///
/// # 参数
/// * `config_path` - 可选的配置文件路径
///   - `Some(path)`: 从指定文件加载（不存在则创建）
///   - `None`: 从默认 "config.toml" 加载（不存在则警告）
pub fn init_config(config_path: Option<String>) -> &'static AppConfig {
    if let Some(path) = &config_path {
        CONFIG_PATH.set(path.clone()).ok();
    }

    CONFIG.get_or_init(|| AppConfig::load(config_path.as_deref()))
}

/// 获取使用的配置文件路径
pub fn get_config_path() -> Option<&'static str> {
    CONFIG_PATH.get().map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_expires_in, "7d");
        assert_eq!(config.auth.cookie_name, "token");
        assert!(config.auth.jwt_private_key.is_none());
        assert_eq!(config.log.format, "pretty");
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::from_toml(
            r#"
            [auth]
            jwt_secret = "file-secret"
            jwt_expires_in = "12h"

            [seed]
            admin_email = "admin@grocer.test"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.auth.jwt_expires_in, "12h");
        assert_eq!(config.auth.min_password_length, 6);
        assert_eq!(config.seed.admin_email.as_deref(), Some("admin@grocer.test"));
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_sample_config_parses_back() {
        let sample = AppConfig::generate_sample_config();
        let parsed = AppConfig::from_toml(&sample).unwrap();
        assert_eq!(parsed.auth.jwt_expires_in, "7d");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SERVER_PORT", "9090"),
            ("JWT_SECRET", "env-secret"),
            ("JWT_EXPIRES_IN", "30m"),
            ("AUTH_COOKIE_SECURE", "1"),
            ("LOG_MAX_BACKUPS", "many"),
        ]);
        let mut config = AppConfig::default();
        config.override_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.jwt_secret, "env-secret");
        assert_eq!(config.auth.jwt_expires_in, "30m");
        assert!(config.auth.cookie_secure);
        // 无效值保持默认
        assert_eq!(config.log.max_backups, 5);
    }

    #[test]
    fn test_validate_warns_on_weak_signing() {
        let config = AppConfig::default();
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("empty HMAC key")));

        let mut config = AppConfig::default();
        config.auth.jwt_private_key = Some("PRIV".into());
        config.auth.jwt_secret = "x".repeat(40);
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("one half"));
    }

    #[test]
    fn test_validate_accepts_key_pair() {
        let mut config = AppConfig::default();
        config.auth.jwt_private_key = Some("PRIV".into());
        config.auth.jwt_public_key = Some("PUB".into());
        assert!(config.validate().is_empty());
    }
}
