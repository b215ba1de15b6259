//! 触发消息 - 编排层
//!
//! 调用方发送 `{"action": "startAutofill"}`，得到 `FillResult` 或 `{"error": "..."}`。
//! 其它 action 不做响应

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::infrastructure::{Document, Scope};
use crate::models::{CandidateProfile, FillResult};
use crate::orchestrator::form_filler::FormFiller;

/// 唯一会被处理的 action
pub const START_AUTOFILL: &str = "startAutofill";

/// 找不到可附着的页面
pub const NO_ACTIVE_TAB: &str = "No active tab";

/// 页面脚本通道不可用
pub const TRANSPORT_FAILURE: &str = "Failed to communicate with content script";

/// 触发消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMessage {
    pub action: String,
}

impl TriggerMessage {
    pub fn start_autofill() -> Self {
        Self {
            action: START_AUTOFILL.to_string(),
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_start_autofill(&self) -> bool {
        self.action == START_AUTOFILL
    }
}

/// 触发响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerResponse {
    Filled(FillResult),
    Error { error: String },
}

impl TriggerResponse {
    pub fn no_active_tab() -> Self {
        TriggerResponse::Error {
            error: NO_ACTIVE_TAB.to_string(),
        }
    }

    pub fn transport_failure() -> Self {
        TriggerResponse::Error {
            error: TRANSPORT_FAILURE.to_string(),
        }
    }

    /// 是否是一次成功的填写
    pub fn succeeded(&self) -> bool {
        matches!(self, TriggerResponse::Filled(result) if result.success)
    }
}

impl From<FillResult> for TriggerResponse {
    fn from(result: FillResult) -> Self {
        TriggerResponse::Filled(result)
    }
}

/// 处理一条触发消息，非 `startAutofill` 不响应
pub async fn handle_message<D: Document>(
    filler: &FormFiller<D>,
    profile: &CandidateProfile,
    message: &TriggerMessage,
) -> Option<TriggerResponse> {
    if !message.is_start_autofill() {
        debug!("忽略 action: {}", message.action);
        return None;
    }
    Some(start_autofill(filler, profile).await)
}

/// 先确认页面脚本通道可用，再执行填写
pub async fn start_autofill<D: Document>(
    filler: &FormFiller<D>,
    profile: &CandidateProfile,
) -> TriggerResponse {
    if let Err(e) = filler.document().find_all_by_tag(Scope::Document, "html").await {
        error!("❌ 页面通信失败: {:#}", e);
        return TriggerResponse::transport_failure();
    }

    filler.run(profile).await.into()
}
