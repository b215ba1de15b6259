//! 简历上传服务 - 业务能力层
//!
//! 读取简历文件（本地路径或 http(s) 地址），放入页面上接受 .pdf / .doc 的文件输入框。
//! 任何失败都只记录日志，不影响整体填写结果

use anyhow::{anyhow, Context, Result};
use phf::phf_map;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::FillError;
use crate::infrastructure::{Document, Scope};
use crate::models::{ControlKind, DomEvent, Element, ResumeFile};

/// 扩展名 → MIME 类型
static RESUME_MIME_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "pdf" => "application/pdf",
    "doc" => "application/msword",
    "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "rtf" => "application/rtf",
    "txt" => "text/plain",
};

const FALLBACK_MIME: &str = "application/octet-stream";

/// 文件输入框的 accept 中需要包含的类型之一
const ACCEPTED_EXTENSIONS: [&str; 2] = [".pdf", ".doc"];

/// 简历来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeSource {
    Path(PathBuf),
    Url(String),
}

impl ResumeSource {
    /// `http://` / `https://` 开头视为 URL，其余视为本地路径
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            ResumeSource::Url(raw.to_string())
        } else {
            ResumeSource::Path(PathBuf::from(raw))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ResumeSource::Path(path) => path.display().to_string(),
            ResumeSource::Url(url) => url.clone(),
        }
    }

    /// 读取简历内容
    pub async fn load(&self) -> Result<ResumeFile> {
        match self {
            ResumeSource::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("无法读取简历文件: {}", path.display()))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "resume".to_string());
                Ok(ResumeFile {
                    mime_type: guess_mime(&name).to_string(),
                    name,
                    bytes,
                })
            }
            ResumeSource::Url(url) => {
                let response = reqwest::get(url)
                    .await
                    .with_context(|| format!("无法下载简历: {}", url))?
                    .error_for_status()?;
                let header_mime = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
                    .filter(|v| !v.is_empty() && v != FALLBACK_MIME);
                let bytes = response.bytes().await?.to_vec();
                let name = file_name_from_url(url);
                let mime_type = header_mime.unwrap_or_else(|| guess_mime(&name).to_string());
                Ok(ResumeFile {
                    name,
                    mime_type,
                    bytes,
                })
            }
        }
    }
}

/// 按扩展名猜测 MIME 类型
pub fn guess_mime(file_name: &str) -> &'static str {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| RESUME_MIME_TYPES.get(ext.as_str()).copied())
        .unwrap_or(FALLBACK_MIME)
}

fn file_name_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("resume")
        .to_string()
}

/// 是否为可以接收简历的文件输入框
fn accepts_resume(el: &Element) -> bool {
    el.kind() == ControlKind::File
        && el
            .attr("accept")
            .map(|accept| ACCEPTED_EXTENSIONS.iter().any(|ext| accept.contains(ext)))
            .unwrap_or(false)
}

/// 简历上传服务
#[derive(Debug, Clone)]
pub struct ResumeUploader {
    source: ResumeSource,
}

impl ResumeUploader {
    pub fn new(source: ResumeSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &ResumeSource {
        &self.source
    }

    /// 上传简历，返回是否成功；失败只记录日志
    pub async fn upload<D: Document>(&self, doc: &D) -> bool {
        match self.try_upload(doc).await {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ 简历上传失败（已忽略）: {}", e);
                false
            }
        }
    }

    async fn try_upload<D: Document>(&self, doc: &D) -> std::result::Result<(), FillError> {
        let external = |e: anyhow::Error| FillError::ExternalResource {
            resource: format!("resume {}", self.source.describe()),
            source: e.into(),
        };

        let inputs = doc
            .find_all_by_tag(Scope::Document, "input")
            .await
            .map_err(external)?;
        let Some(target) = inputs.into_iter().find(accepts_resume) else {
            return Err(external(anyhow!("页面上没有接受简历的文件输入框")));
        };

        let file = self.source.load().await.map_err(external)?;
        info!("📎 上传简历 {} ({} 字节)", file.name, file.bytes.len());

        doc.set_files(target.handle, &file).await.map_err(external)?;
        doc.dispatch_event(target.handle, DomEvent::Change)
            .await
            .map_err(external)?;

        Ok(())
    }
}
