use crate::models::profile::{ApplicationDetails, CandidateProfile};
use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载候选人资料
///
/// 兼容两种格式：`{ "candidate": {...} }` 和直接的资料对象
pub async fn load_profile(path: &Path) -> Result<CandidateProfile> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取资料文件: {}", path.display()))?;

    let profile = parse_profile(&content)
        .with_context(|| format!("无法解析资料文件: {}", path.display()))?;

    tracing::info!(
        "已加载资料: {} 段工作经历, {} 段教育经历",
        profile.experience.len(),
        profile.education.len()
    );

    Ok(profile)
}

/// 解析资料 JSON 文本
pub fn parse_profile(content: &str) -> Result<CandidateProfile> {
    let value: JsonValue = serde_json::from_str(content)?;

    if value.get("candidate").is_some() {
        let details: ApplicationDetails = serde_json::from_value(value)?;
        Ok(details.candidate)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}
