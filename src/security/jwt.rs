use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use sha2::Sha256;

use crate::errors::AppError;
use crate::security::clock::{Clock, SystemClock};
use crate::security::keys::{KeySource, SigningMaterial};
use crate::security::lifetime::parse_lifetime;

/// Token 主体中的声明集合
pub type ClaimSet = Map<String, Value>;

/// 保留声明，始终覆盖调用方传入的同名值
pub const CLAIM_ISSUED_AT: &str = "iat";
pub const CLAIM_EXPIRES_AT: &str = "exp";

/// 会话 Token 携带的用户身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // user_id
    pub role: String, // customer / admin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub iat: i64, // 签发时间戳
    #[serde(default)]
    pub exp: i64, // 过期时间戳
}

impl Claims {
    pub fn new(sub: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            role: role.into(),
            email: None,
            name: None,
            iat: 0,
            exp: 0,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

pub struct JwtManager {
    keys: Arc<dyn KeySource>,
    clock: Arc<dyn Clock>,
}

impl JwtManager {
    pub fn new(keys: Arc<dyn KeySource>) -> Self {
        Self::with_clock(keys, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: Arc<dyn KeySource>, clock: Arc<dyn Clock>) -> Self {
        Self { keys, clock }
    }

    /// 当前配置下的 Token 有效期（秒）
    pub fn lifetime_secs(&self) -> i64 {
        parse_lifetime(self.keys.signing_settings().expires_in.as_deref())
    }

    /// 签发 Token
    ///
    /// `iat`/`exp` 由此处写入，调用方的同名声明会被覆盖。
    pub fn issue(&self, claims: &ClaimSet) -> Result<String, AppError> {
        let settings = self.keys.signing_settings();
        let material = SigningMaterial::resolve(&settings);

        let iat = self.clock.now();
        let exp = iat.saturating_add(parse_lifetime(settings.expires_in.as_deref()));

        let header = json!({ "alg": material.algorithm(), "typ": "JWT" });
        let mut body = claims.clone();
        body.insert(CLAIM_ISSUED_AT.to_string(), Value::from(iat));
        body.insert(CLAIM_EXPIRES_AT.to_string(), Value::from(exp));

        let signing_input = format!(
            "{}.{}",
            encode_segment(&header)?,
            encode_segment(&Value::Object(body))?
        );
        let signature = sign(&material, signing_input.as_bytes())?;

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// 以任意可序列化为 JSON 对象的结构签发 Token
    pub fn issue_claims<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        match serde_json::to_value(claims) {
            Ok(Value::Object(map)) => self.issue(&map),
            Ok(_) => Err(AppError::Internal("JWT claims must be a JSON object".into())),
            Err(e) => Err(AppError::Internal(format!("JWT claims encode failed: {}", e))),
        }
    }

    /// 验证并解析 Token
    ///
    /// 结构错误 -> `InvalidToken`，签名不符 -> `InvalidSignature`，
    /// 签名有效但已过期 -> `TokenExpired`。
    pub fn verify(&self, token: &str) -> Result<ClaimSet, AppError> {
        let segments: Vec<&str> = token.split('.').collect();
        let &[header, body, signature] = segments.as_slice() else {
            return Err(AppError::InvalidToken);
        };

        // 签名覆盖原始编码文本，不做重新编码
        let signing_input = &token[..header.len() + 1 + body.len()];

        let material = SigningMaterial::resolve(&self.keys.signing_settings());
        if !verify_signature(&material, signing_input.as_bytes(), signature)? {
            return Err(AppError::InvalidSignature);
        }

        let claims = decode_segment(body)?;

        if let Some(exp) = claims.get(CLAIM_EXPIRES_AT).and_then(Value::as_f64)
            && (self.clock.now() as f64) > exp
        {
            return Err(AppError::TokenExpired);
        }

        Ok(claims)
    }

    /// 验证 Token 并反序列化为指定结构
    pub fn verify_claims<T: DeserializeOwned>(&self, token: &str) -> Result<T, AppError> {
        let claims = self.verify(token)?;
        serde_json::from_value(Value::Object(claims)).map_err(|_| AppError::InvalidToken)
    }
}

fn encode_segment(value: &Value) -> Result<String, AppError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| AppError::Internal(format!("JWT encode failed: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment(segment: &str) -> Result<ClaimSet, AppError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AppError::InvalidToken)?;
    serde_json::from_slice::<ClaimSet>(&bytes).map_err(|_| AppError::InvalidToken)
}

fn hmac_sha256(secret: &str) -> Result<Hmac<Sha256>, AppError> {
    Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC init failed: {}", e)))
}

/// 返回 base64url 编码的签名
fn sign(material: &SigningMaterial, input: &[u8]) -> Result<String, AppError> {
    match material {
        SigningMaterial::Symmetric { secret } => {
            let mut mac = hmac_sha256(secret)?;
            mac.update(input);
            Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
        }
        SigningMaterial::Asymmetric { private_key, .. } => {
            let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
                .map_err(|e| AppError::Config(format!("Invalid RSA private key: {}", e)))?;
            jsonwebtoken::crypto::sign(input, &key, Algorithm::RS256)
                .map_err(|e| AppError::Internal(format!("JWT sign failed: {}", e)))
        }
    }
}

fn verify_signature(
    material: &SigningMaterial,
    input: &[u8],
    signature: &str,
) -> Result<bool, AppError> {
    match material {
        SigningMaterial::Symmetric { secret } => {
            let Ok(provided) = URL_SAFE_NO_PAD.decode(signature) else {
                return Ok(false);
            };
            let mut mac = hmac_sha256(secret)?;
            mac.update(input);
            // verify_slice 为常量时间比较
            Ok(mac.verify_slice(&provided).is_ok())
        }
        SigningMaterial::Asymmetric { public_key, .. } => {
            let key = DecodingKey::from_rsa_pem(public_key.as_bytes())
                .map_err(|e| AppError::Config(format!("Invalid RSA public key: {}", e)))?;
            Ok(jsonwebtoken::crypto::verify(signature, input, &key, Algorithm::RS256)
                .unwrap_or(false))
        }
    }
}
