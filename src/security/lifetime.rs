//! Token 有效期解析
//!
//! 支持的格式: `<n>d`（天）、`<n>h`（小时）、`<n>m`（分钟）、`<n>`（秒）。
//! 允许负数，以便签发立即过期的 Token。

/// 默认有效期: 7 天
pub const DEFAULT_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// 解析有效期字符串，未设置或无法解析时返回 7 天
pub fn parse_lifetime(value: Option<&str>) -> i64 {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(parse_duration)
        .unwrap_or(DEFAULT_LIFETIME_SECS)
}

fn parse_duration(value: &str) -> Option<i64> {
    let (number, unit) = match value.char_indices().last()? {
        (idx, 'd') => (&value[..idx], 86_400),
        (idx, 'h') => (&value[..idx], 3_600),
        (idx, 'm') => (&value[..idx], 60),
        _ => (value, 1),
    };

    number.parse::<i64>().ok()?.checked_mul(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes() {
        assert_eq!(parse_lifetime(Some("7d")), 604_800);
        assert_eq!(parse_lifetime(Some("1h")), 3_600);
        assert_eq!(parse_lifetime(Some("15m")), 900);
        assert_eq!(parse_lifetime(Some("45")), 45);
        assert_eq!(parse_lifetime(Some(" 2h ")), 7_200);
    }

    #[test]
    fn test_negative_lifetime() {
        assert_eq!(parse_lifetime(Some("-1")), -1);
        assert_eq!(parse_lifetime(Some("-1h")), -3_600);
    }

    #[test]
    fn test_fallback_to_default() {
        assert_eq!(parse_lifetime(None), DEFAULT_LIFETIME_SECS);
        assert_eq!(parse_lifetime(Some("")), DEFAULT_LIFETIME_SECS);
        assert_eq!(parse_lifetime(Some("soon")), DEFAULT_LIFETIME_SECS);
        assert_eq!(parse_lifetime(Some("h")), DEFAULT_LIFETIME_SECS);
        assert_eq!(parse_lifetime(Some("1.5h")), DEFAULT_LIFETIME_SECS);
        assert_eq!(parse_lifetime(Some("3w")), DEFAULT_LIFETIME_SECS);
        assert_eq!(parse_lifetime(Some("99999999999999999d")), DEFAULT_LIFETIME_SECS);
    }
}
