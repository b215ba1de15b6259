use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult, ConfigError};
use crate::services::{ResumeSource, ResumeUploader};
use crate::workflow::SettleDelays;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "AUTOFILL_CONFIG";
/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "autofill.toml";

/// 程序配置文件
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标页面 URL（找不到已打开的页面时会新开并导航）
    pub target_url: Option<String>,
    /// 目标页面标题（包含即可）
    pub target_title: Option<String>,
    /// 是否自行启动无头浏览器
    pub headless: bool,
    /// 无头模式使用的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 候选人资料文件
    pub profile_path: String,
    /// 简历（本地路径或 http(s) 地址）
    pub resume: Option<String>,
    // --- 等待时长（毫秒） ---
    pub phase_delay_ms: u64,
    pub entry_delay_ms: u64,
    /// 0 表示不轮询
    pub entry_poll_timeout_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: None,
            target_title: None,
            headless: false,
            chrome_executable: None,
            profile_path: "candidate.json".to_string(),
            resume: None,
            phase_delay_ms: 1000,
            entry_delay_ms: 500,
            entry_poll_timeout_ms: 0,
            verbose_logging: false,
            output_log_file: "autofill.log".to_string(),
        }
    }
}

impl Config {
    /// 读取配置：默认值 ← TOML 文件（存在时） ← 环境变量
    pub fn load() -> AppResult<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        base.with_overrides(|key: &str| std::env::var(key).ok())
    }

    pub fn from_env() -> AppResult<Self> {
        Self::default().with_overrides(|key: &str| std::env::var(key).ok())
    }

    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::Config(ConfigError::TomlParseFailed { source, .. }) => {
                AppError::Config(ConfigError::TomlParseFailed {
                    path: path.to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 用 `lookup` 提供的变量覆盖对应字段
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        if let Some(v) = parsed(&lookup, "BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = v;
        }
        if let Some(v) = lookup("TARGET_URL") {
            self.target_url = Some(v);
        }
        if let Some(v) = lookup("TARGET_TITLE") {
            self.target_title = Some(v);
        }
        if let Some(v) = parsed(&lookup, "HEADLESS", "bool")? {
            self.headless = v;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = lookup("PROFILE_PATH") {
            self.profile_path = v;
        }
        if let Some(v) = lookup("RESUME") {
            self.resume = Some(v);
        }
        if let Some(v) = parsed(&lookup, "PHASE_DELAY_MS", "u64")? {
            self.phase_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "ENTRY_DELAY_MS", "u64")? {
            self.entry_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "ENTRY_POLL_TIMEOUT_MS", "u64")? {
            self.entry_poll_timeout_ms = v;
        }
        if let Some(v) = parsed(&lookup, "VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        if let Some(v) = lookup("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        Ok(self)
    }

    pub fn settle_delays(&self) -> SettleDelays {
        SettleDelays {
            phase: Duration::from_millis(self.phase_delay_ms),
            entry: Duration::from_millis(self.entry_delay_ms),
            entry_poll_timeout: Duration::from_millis(self.entry_poll_timeout_ms),
            ..SettleDelays::default()
        }
    }

    /// 配置了简历时返回上传服务
    pub fn resume_uploader(&self) -> Option<ResumeUploader> {
        self.resume
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| ResumeUploader::new(ResumeSource::parse(s)))
    }

    /// 日志里显示的目标页面
    pub fn target_description(&self) -> String {
        match (&self.target_title, &self.target_url) {
            (Some(title), _) => format!("标题包含 '{}'", title),
            (None, Some(url)) => url.clone(),
            (None, None) => "当前活动页面".to_string(),
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> AppResult<Option<T>> {
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            })
        }),
    }
}
