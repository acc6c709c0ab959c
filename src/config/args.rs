//! 命令行参数解析
//!
//! 提供配置文件路径提取与运行模式检测

/// 运行模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 启动 HTTP 服务（默认）
    Serve,
    /// 生成密码记录，用于手工写入用户数据
    HashPassword(String),
    /// 输出示例配置
    SampleConfig,
}

/// 从命令行参数解析配置文件路径
///
/// 支持多种格式:
/// - `-c path` / `--config path`
/// - `-c=path` / `--config=path`
pub fn parse_config_path(args: &[String]) -> Option<String> {
    let mut iter = args.iter().skip(1); // 跳过程序名
    while let Some(arg) = iter.next() {
        if arg == "-c" || arg == "--config" {
            return iter.next().cloned();
        }

        if let Some(path) = arg
            .strip_prefix("-c=")
            .or_else(|| arg.strip_prefix("--config="))
        {
            return Some(path.to_string());
        }
    }

    None
}

/// 从参数列表中过滤掉配置相关参数
///
/// 移除 `-c`/`--config` 及其值,避免干扰模式检测
pub fn filter_config_args(args: &[String]) -> Vec<String> {
    let mut filtered = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if arg == "-c" || arg == "--config" {
            i += 2;
            continue;
        }

        if arg.starts_with("-c=") || arg.starts_with("--config=") {
            i += 1;
            continue;
        }

        filtered.push(arg.clone());
        i += 1;
    }

    filtered
}

/// 检测运行模式（参数包含程序名在索引 0）
pub fn parse_command(args: &[String]) -> Result<Command, String> {
    let filtered = filter_config_args(args);
    let mut rest = filtered.iter().skip(1).map(String::as_str);

    match rest.next() {
        None | Some("serve") => Ok(Command::Serve),
        Some("hash-password") => rest
            .next()
            .map(|password| Command::HashPassword(password.to_string()))
            .ok_or_else(|| "usage: hash-password <password>".to_string()),
        Some("sample-config") => Ok(Command::SampleConfig),
        Some(other) => Err(format!("unknown command: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_config_path_flags() {
        for case in [
            args(&["program", "-c", "custom.toml"]),
            args(&["program", "--config", "custom.toml"]),
            args(&["program", "-c=custom.toml"]),
            args(&["program", "serve", "--config=custom.toml"]),
        ] {
            assert_eq!(parse_config_path(&case), Some("custom.toml".to_string()));
        }
    }

    #[test]
    fn test_parse_config_path_none() {
        assert_eq!(parse_config_path(&args(&["program", "serve"])), None);
        assert_eq!(parse_config_path(&args(&["program", "-c"])), None);
    }

    #[test]
    fn test_filter_config_args() {
        let filtered = filter_config_args(&args(&["program", "-c", "custom.toml", "serve"]));
        assert_eq!(filtered, args(&["program", "serve"]));

        let filtered = filter_config_args(&args(&["program", "--config=custom.toml", "serve"]));
        assert_eq!(filtered, args(&["program", "serve"]));
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command(&args(&["program"])), Ok(Command::Serve));
        assert_eq!(
            parse_command(&args(&["program", "-c", "serve.toml"])),
            Ok(Command::Serve)
        );
        assert_eq!(
            parse_command(&args(&["program", "hash-password", "s3cret"])),
            Ok(Command::HashPassword("s3cret".to_string()))
        );
        assert_eq!(
            parse_command(&args(&["program", "sample-config", "-c=x.toml"])),
            Ok(Command::SampleConfig)
        );
        assert!(parse_command(&args(&["program", "hash-password"])).is_err());
        assert!(parse_command(&args(&["program", "migrate"])).is_err());
    }
}
