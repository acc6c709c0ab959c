//! Panic handler module
//!
//! 显示带堆栈的 panic 信息，并追加写入 crash.log。
//! 报告只包含 panic 消息、位置与堆栈，不包含请求数据。

use chrono::Utc;
use std::backtrace::Backtrace;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::panic::{self, PanicHookInfo};

const CRASH_LOG: &str = "crash.log";
const RULE: &str = "═══════════════════════════════════════════════════";

/// 单次 panic 的报告
struct CrashReport {
    timestamp: String,
    message: String,
    location: String,
    backtrace: String,
}

impl CrashReport {
    fn capture(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Unknown panic".to_string());

        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        Self {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            message,
            location,
            backtrace: format!("{:?}", Backtrace::force_capture()),
        }
    }

    fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "==========================================")?;
        writeln!(
            out,
            "Crash Report - grocergate v{} - {}",
            env!("CARGO_PKG_VERSION"),
            self.timestamp
        )?;
        writeln!(out, "==========================================")?;
        writeln!(out, "Message: {}", self.message)?;
        writeln!(out, "Location: {}", self.location)?;
        writeln!(out, "\nBacktrace:")?;
        writeln!(out, "{}", self.backtrace)?;
        writeln!(out, "==========================================\n")
    }

    fn append_to_log(&self) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(CRASH_LOG)?;
        self.write_to(&mut file)
    }

    fn display(&self) {
        use colored::Colorize;

        eprintln!();
        eprintln!("{}", RULE.red().bold());
        eprintln!("{}", "PANIC".red().bold());
        eprintln!("{}", RULE.red().bold());
        eprintln!();
        eprintln!("{} {}", "原因:".yellow().bold(), self.message.white());
        eprintln!("{} {}", "位置:".yellow().bold(), self.location.white());
        eprintln!();
        eprintln!("{}", "堆栈跟踪:".yellow().bold());
        eprintln!("{}", self.backtrace.dimmed());
        eprintln!();
        eprintln!("{}", format!("详细信息已保存到 {}", CRASH_LOG).cyan());
        eprintln!("{}", RULE.red().bold());
        eprintln!();
    }
}

/// 安装自定义 panic hook
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let report = CrashReport::capture(info);

        if let Err(e) = report.append_to_log() {
            eprintln!("Failed to write crash log: {}", e);
        }

        report.display();
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_report_layout() {
        let report = CrashReport {
            timestamp: "2026-01-01 00:00:00 UTC".to_string(),
            message: "boom".to_string(),
            location: "src/main.rs:1:1".to_string(),
            backtrace: "<frames>".to_string(),
        };

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Message: boom"));
        assert!(text.contains("Location: src/main.rs:1:1"));
        assert!(text.contains("2026-01-01 00:00:00 UTC"));
        assert!(text.ends_with("==========================================\n\n"));
    }
}
