use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和结果落盘的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::FillResult;

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；否则默认 `info`，`verbose` 时为 `debug`。
/// 重复调用不会报错（测试里会多次调用）
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n表单自动填写日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `profile_path`: 候选人资料文件
/// - `target`: 目标页面描述
pub fn log_startup(profile_path: &str, target: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - Greenhouse 申请表自动填写");
    info!("📄 候选人资料: {}", profile_path);
    info!("🌐 目标页面: {}", target);
    info!("{}", "=".repeat(60));
}

/// 把一次填写结果追加到日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `result`: 填写结果
pub fn append_result(log_file_path: &str, result: &FillResult) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    writeln!(
        file,
        "[{}] success={} message={}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        result.success,
        result.message.as_deref().unwrap_or("-")
    )?;
    Ok(())
}

/// 打印最终结果
///
/// # 参数
/// - `result`: 填写结果
/// - `log_file_path`: 日志文件路径
pub fn print_final_result(result: &FillResult, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 填写完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if result.success {
        info!("✅ 成功");
    } else {
        info!("❌ 失败");
    }
    if let Some(message) = &result.message {
        info!("💬 {}", message);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 5), "短文本");
        assert_eq!(truncate_text("Responsibilities", 4), "Resp...");
        assert_eq!(truncate_text("工作经历描述", 2), "工作...");
    }

    #[test]
    fn test_log_file_header_and_results() {
        let path = std::env::temp_dir().join(format!("autofill_log_{}.log", std::process::id()));
        let path = path.to_string_lossy().to_string();

        init_log_file(&path).unwrap();
        append_result(&path, &FillResult::success()).unwrap();
        append_result(&path, &FillResult::failure("Not a Greenhouse application form")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("表单自动填写日志"));
        assert!(content.contains("success=true message=-"));
        assert!(content.contains("success=false message=Not a Greenhouse application form"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
