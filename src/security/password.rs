use std::fmt;
use std::str::FromStr;

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Sha224, Sha256, Sha384, Sha512};

/// 记录中的算法标识
pub const PASSWORD_ALGORITHM: &str = "pbkdf2";
/// PBKDF2 迭代次数
pub const PBKDF2_ITERATIONS: u32 = 120_000;
pub const SALT_LENGTH: usize = 16;
pub const KEY_LENGTH: usize = 32;

const RECORD_DELIMITER: char = ':';
const RECORD_SEGMENTS: usize = 5;

/// PBKDF2 使用的 HMAC 摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Digest {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Digest {
    pub fn name(&self) -> &'static str {
        match self {
            Digest::Sha224 => "sha224",
            Digest::Sha256 => "sha256",
            Digest::Sha384 => "sha384",
            Digest::Sha512 => "sha512",
        }
    }

    fn derive(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        match self {
            Digest::Sha224 => pbkdf2_hmac::<Sha224>(password, salt, iterations, out),
            Digest::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, out),
            Digest::Sha384 => pbkdf2_hmac::<Sha384>(password, salt, iterations, out),
            Digest::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, out),
        }
    }
}

impl FromStr for Digest {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha224" => Ok(Digest::Sha224),
            "sha256" => Ok(Digest::Sha256),
            "sha384" => Ok(Digest::Sha384),
            "sha512" => Ok(Digest::Sha512),
            _ => Err(()),
        }
    }
}

/// 存储的密码记录：`pbkdf2:<iterations>:<digest>:<salt-hex>:<key-hex>`
///
/// 记录是自描述的，验证时迭代次数与摘要均从记录本身读取。
#[derive(Clone, PartialEq, Eq)]
struct PasswordRecord {
    iterations: u32,
    digest: Digest,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl PasswordRecord {
    fn derive(password: &str, salt: Vec<u8>, iterations: u32, digest: Digest, key_len: usize) -> Self {
        let mut key = vec![0u8; key_len];
        digest.derive(password.as_bytes(), &salt, iterations, &mut key);
        Self {
            iterations,
            digest,
            salt,
            key,
        }
    }

    /// 解析记录，任何格式问题都返回 None
    fn parse(record: &str) -> Option<Self> {
        let parts: Vec<&str> = record.split(RECORD_DELIMITER).collect();
        if parts.len() != RECORD_SEGMENTS || parts[0] != PASSWORD_ALGORITHM {
            return None;
        }

        let iterations = parts[1].parse::<u32>().ok().filter(|n| *n > 0)?;
        let digest = parts[2].parse::<Digest>().ok()?;
        let salt = hex::decode(parts[3]).ok()?;
        let key = hex::decode(parts[4]).ok()?;

        // 空派生密钥会让任意密码通过比较
        if key.is_empty() {
            return None;
        }

        Some(Self {
            iterations,
            digest,
            salt,
            key,
        })
    }

    fn matches(&self, password: &str) -> bool {
        let candidate = Self::derive(
            password,
            self.salt.clone(),
            self.iterations,
            self.digest,
            self.key.len(),
        );
        constant_time_eq(&candidate.key, &self.key)
    }
}

/// 逐字节异或累积，耗时只与长度有关
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

impl fmt::Display for PasswordRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PASSWORD_ALGORITHM}:{}:{}:{}:{}",
            self.iterations,
            self.digest.name(),
            hex::encode(&self.salt),
            hex::encode(&self.key)
        )
    }
}

pub struct PasswordManager;

impl PasswordManager {
    /// 对密码进行哈希加密（每次调用使用新的随机盐）
    pub fn hash_password(password: &str) -> String {
        Self::hash_password_with(password, PBKDF2_ITERATIONS, Digest::Sha256)
    }

    /// 以指定参数生成密码记录
    pub fn hash_password_with(password: &str, iterations: u32, digest: Digest) -> String {
        let mut salt = vec![0u8; SALT_LENGTH];
        rand::rng().fill_bytes(&mut salt);

        PasswordRecord::derive(password, salt, iterations.max(1), digest, KEY_LENGTH).to_string()
    }

    /// 验证密码是否匹配
    ///
    /// 损坏或无法识别的记录与密码不匹配一样返回 false。
    pub fn verify_password(password: &str, record: &str) -> bool {
        PasswordRecord::parse(record).is_some_and(|parsed| parsed.matches(password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 将派生密钥段中的一个十六进制字符替换为不同的字符
    fn corrupt_key(record: &str) -> String {
        let mut chars: Vec<char> = record.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_password_hash_and_verify() {
        let password = "MySecurePassword123!";
        let hash = PasswordManager::hash_password(password);

        assert!(PasswordManager::verify_password(password, &hash));
        assert!(!PasswordManager::verify_password("WrongPassword", &hash));
    }

    #[test]
    fn test_admin_record_format() {
        let record = PasswordManager::hash_password("admin");
        assert!(record.starts_with("pbkdf2:120000:sha256:"));

        let parts: Vec<&str> = record.split(':').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[3].len(), SALT_LENGTH * 2);
        assert_eq!(parts[4].len(), KEY_LENGTH * 2);

        assert!(PasswordManager::verify_password("admin", &record));
        assert!(!PasswordManager::verify_password("Admin", &record));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = PasswordManager::hash_password("apples");
        let second = PasswordManager::hash_password("apples");

        assert_ne!(first, second);
        assert!(PasswordManager::verify_password("apples", &first));
        assert!(PasswordManager::verify_password("apples", &second));
    }

    #[test]
    fn test_empty_password_is_hashable() {
        let record = PasswordManager::hash_password("");
        assert!(PasswordManager::verify_password("", &record));
        assert!(!PasswordManager::verify_password(" ", &record));
    }

    #[test]
    fn test_corrupted_key_fails() {
        let record = PasswordManager::hash_password("bananas");
        assert!(!PasswordManager::verify_password("bananas", &corrupt_key(&record)));
    }

    #[test]
    fn test_malformed_records_fail_closed() {
        let record = PasswordManager::hash_password("cherries");
        let tail = record.trim_start_matches("pbkdf2:");

        let cases = [
            String::new(),
            "pbkdf2".to_string(),
            "pbkdf2:120000:sha256:00ff".to_string(),
            format!("{record}:extra"),
            format!("bcrypt:{tail}"),
            record.replace(":sha256:", ":md5:"),
            record.replace(":120000:", ":0:"),
            record.replace(":120000:", ":lots:"),
            format!("{}zz", &record[..record.len() - 2]),
            "pbkdf2:1:sha256:00:".to_string(),
        ];

        for case in cases {
            assert!(
                !PasswordManager::verify_password("cherries", &case),
                "record should be rejected: {case}"
            );
        }
    }

    #[test]
    fn test_parameters_are_read_from_record() {
        let record = PasswordManager::hash_password_with("durian", 1_000, Digest::Sha512);
        assert!(record.starts_with("pbkdf2:1000:sha512:"));
        assert!(PasswordManager::verify_password("durian", &record));
        assert!(!PasswordManager::verify_password("Durian", &record));
    }

    #[test]
    fn test_stored_key_length_is_honoured() {
        let salt = vec![7u8; SALT_LENGTH];
        let short = PasswordRecord::derive("eggplant", salt.clone(), 1_000, Digest::Sha256, 16);
        let long = PasswordRecord::derive("eggplant", salt, 1_000, Digest::Sha256, 64);

        assert!(PasswordManager::verify_password("eggplant", &short.to_string()));
        assert!(PasswordManager::verify_password("eggplant", &long.to_string()));
        assert!(!PasswordManager::verify_password("figs", &long.to_string()));
    }

    #[test]
    fn test_record_round_trips_through_parse() {
        let record = PasswordManager::hash_password_with("grapes", 10, Digest::Sha224);
        let parsed = PasswordRecord::parse(&record).unwrap();
        assert_eq!(parsed.iterations, 10);
        assert_eq!(parsed.digest, Digest::Sha224);
        assert_eq!(parsed.to_string(), record);
    }
}
