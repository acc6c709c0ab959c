//! 签名材料与其来源
//!
//! 签名模式在每次签发与验证时重新解析，配置变更（例如从 HS256 轮换到
//! RS256）在下一次调用时立即生效，无需重启。

use std::env;

use crate::config::AuthConfig;

/// 一次调用所需的原始签名配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningSettings {
    pub secret: Option<String>,
    pub private_key: Option<String>,
    pub public_key: Option<String>,
    pub expires_in: Option<String>,
}

/// 签名配置来源，每次签发/验证都会被查询
pub trait KeySource: Send + Sync {
    fn signing_settings(&self) -> SigningSettings;
}

impl KeySource for AuthConfig {
    fn signing_settings(&self) -> SigningSettings {
        SigningSettings {
            secret: Some(self.jwt_secret.clone()),
            private_key: self.jwt_private_key.clone(),
            public_key: self.jwt_public_key.clone(),
            expires_in: Some(self.jwt_expires_in.clone()),
        }
    }
}

/// 环境变量优先、配置文件兜底的实时来源
pub struct LiveKeySource {
    base: AuthConfig,
}

impl LiveKeySource {
    pub const SECRET_VAR: &'static str = "JWT_SECRET";
    pub const PRIVATE_KEY_VAR: &'static str = "JWT_PRIVATE_KEY";
    pub const PUBLIC_KEY_VAR: &'static str = "JWT_PUBLIC_KEY";
    pub const EXPIRES_IN_VAR: &'static str = "JWT_EXPIRES_IN";

    pub fn new(base: AuthConfig) -> Self {
        Self { base }
    }

    fn overlay<F>(&self, lookup: F) -> SigningSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = self.base.signing_settings();
        SigningSettings {
            secret: lookup(Self::SECRET_VAR).or(base.secret),
            private_key: lookup(Self::PRIVATE_KEY_VAR).or(base.private_key),
            public_key: lookup(Self::PUBLIC_KEY_VAR).or(base.public_key),
            expires_in: lookup(Self::EXPIRES_IN_VAR).or(base.expires_in),
        }
    }
}

impl KeySource for LiveKeySource {
    fn signing_settings(&self) -> SigningSettings {
        self.overlay(|name| env::var(name).ok())
    }
}

/// 解析后的签名材料
#[derive(Clone, PartialEq, Eq)]
pub enum SigningMaterial {
    /// HS256，共享密钥
    Symmetric { secret: String },
    /// RS256，PEM 编码的密钥对
    Asymmetric {
        private_key: String,
        public_key: String,
    },
}

impl SigningMaterial {
    /// 私钥与公钥同时存在时使用 RS256，否则回退到 HS256。
    ///
    /// 共享密钥为空时仍以空密钥签名，不会报错。
    pub fn resolve(settings: &SigningSettings) -> Self {
        match (present(&settings.private_key), present(&settings.public_key)) {
            (Some(private_key), Some(public_key)) => SigningMaterial::Asymmetric {
                private_key: unescape_pem(private_key),
                public_key: unescape_pem(public_key),
            },
            _ => SigningMaterial::Symmetric {
                secret: settings
                    .secret
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            },
        }
    }

    /// JWT header 中的 `alg`
    pub fn algorithm(&self) -> &'static str {
        match self {
            SigningMaterial::Symmetric { .. } => "HS256",
            SigningMaterial::Asymmetric { .. } => "RS256",
        }
    }
}

// 不输出任何密钥内容
impl std::fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("alg", &self.algorithm())
            .finish_non_exhaustive()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// 环境变量中的 PEM 常以字面量 `\n` 表示换行
fn unescape_pem(value: &str) -> String {
    value.trim().replace("\\n", "\n")
}
