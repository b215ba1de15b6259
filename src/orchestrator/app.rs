//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：初始化日志文件、连接（或启动）浏览器、创建 CdpDocument
//! 2. **资料加载**：读取候选人资料
//! 3. **触发填写**：发送一次 `startAutofill`，得到 `TriggerResponse`
//! 4. **结果落盘**：把结果追加到日志文件
//!
//! 唯一持有 Browser 的模块；Browser 被丢弃时连接随之关闭

use anyhow::Result;
use chromiumoxide::Browser;
use std::path::Path;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::{CdpDocument, JsExecutor};
use crate::models::{load_profile, CandidateProfile};
use crate::orchestrator::form_filler::FormFiller;
use crate::orchestrator::trigger::{start_autofill, TriggerResponse};
use crate::utils::logging::{append_result, init_log_file, log_startup, print_final_result};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    filler: FormFiller<CdpDocument>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .map_err(|e| AppError::Other(format!("{}: {:#}", config.output_log_file, e)))?;

        log_startup(&config.profile_path, &config.target_description());

        let (browser, page) = if config.headless {
            let url = config
                .target_url
                .as_deref()
                .ok_or(AppError::Browser(BrowserError::NoActivePage))?;
            browser::launch_headless_browser(url, config.chrome_executable.as_deref()).await?
        } else {
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                config.target_url.as_deref(),
                config.target_title.as_deref(),
            )
            .await?
        };

        // CdpDocument 通过 JsExecutor 持有 page
        let document = CdpDocument::new(JsExecutor::new(page));
        let filler = FormFiller::new(document)
            .with_delays(config.settle_delays())
            .with_resume(config.resume_uploader());

        if let Some(uploader) = config.resume_uploader() {
            info!("📎 简历来源: {}", uploader.source().describe());
        }

        Ok(Self {
            config,
            _browser: browser,
            filler,
        })
    }

    /// 运行应用主逻辑：加载资料并触发一次填写
    pub async fn run(&self) -> Result<TriggerResponse> {
        let profile = self.load_profile().await?;

        let response = start_autofill(&self.filler, &profile).await;

        match &response {
            TriggerResponse::Filled(result) => {
                if let Err(e) = append_result(&self.config.output_log_file, result) {
                    warn!("⚠️ 写入日志文件失败: {}", e);
                }
                print_final_result(result, &self.config.output_log_file);
            }
            TriggerResponse::Error { error } => warn!("⚠️ 填写未执行: {}", error),
        }

        Ok(response)
    }

    /// 加载候选人资料
    async fn load_profile(&self) -> Result<CandidateProfile> {
        info!("\n📁 正在读取候选人资料...");
        load_profile(Path::new(&self.config.profile_path)).await
    }
}
