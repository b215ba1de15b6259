//! 表单填写编排器 - 编排层
//!
//! ## 职责
//!
//! 判断当前页面是否为 Greenhouse 申请表，然后依次调度各个分区：
//!
//! 1. **基本信息**：`workflow::BasicInfoFiller`
//! 2. **工作经历**：`workflow::RepeatedSectionController` + `RepeatedSection::EXPERIENCE`
//! 3. **教育经历**：`workflow::RepeatedSectionController` + `RepeatedSection::EDUCATION`
//! 4. **简历上传**（可选）：`services::ResumeUploader`
//!
//! 分区之间固定等待，让页面自身的脚本处理完上一批事件。
//! 任何阶段的错误（包括单个条目失败）都使整次填写失败，已写入的字段不回滚

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::error::FillError;
use crate::infrastructure::{Document, Scope};
use crate::models::{CandidateProfile, FillResult};
use crate::services::ResumeUploader;
use crate::workflow::settle::pause;
use crate::workflow::{BasicInfoFiller, RepeatedSection, RepeatedSectionController, SettleDelays};

/// 申请表 `<form>` 的 id
const FORM_ID: &str = "application-form";
/// 申请表容器的 class
const FORM_CLASS: &str = "application--form";

/// 表单填写编排器
pub struct FormFiller<D: Document> {
    doc: D,
    delays: SettleDelays,
    resume: Option<ResumeUploader>,
}

impl<D: Document> FormFiller<D> {
    pub fn new(doc: D) -> Self {
        Self {
            doc,
            delays: SettleDelays::default(),
            resume: None,
        }
    }

    pub fn with_delays(mut self, delays: SettleDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_resume(mut self, uploader: Option<ResumeUploader>) -> Self {
        self.resume = uploader;
        self
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn delays(&self) -> SettleDelays {
        self.delays
    }

    /// 页面上有 `<form id="application-form">` 或 `.application--form` 即视为目标表单
    pub async fn detect(&self) -> Result<bool> {
        let by_id = self
            .doc
            .find_by_id(Scope::Document, FORM_ID)
            .await?
            .filter(|el| el.tag.eq_ignore_ascii_case("form"));
        if by_id.is_some() {
            return Ok(true);
        }

        Ok(self
            .doc
            .find_by_class(Scope::Document, FORM_CLASS)
            .await?
            .is_some())
    }

    /// 执行一次完整填写
    pub async fn run(&self, profile: &CandidateProfile) -> FillResult {
        match self.detect().await {
            Ok(true) => {}
            Ok(false) => {
                warn!("⚠️ 当前页面不是 Greenhouse 申请表，跳过");
                return FillResult::from(&FillError::NotTargetForm);
            }
            Err(e) => return self.failed(&e),
        }

        info!("📝 检测到 Greenhouse 申请表，开始填写");
        match self.fill_sections(profile).await {
            Ok(notes) if notes.is_empty() => {
                info!("✅ 表单填写完成");
                FillResult::success()
            }
            Ok(notes) => {
                warn!("⚠️ 表单已填完，但有 {} 个条目失败", notes.len());
                FillResult::from(&FillError::Runtime(notes.join("; ")))
            }
            Err(e) => self.failed(&e),
        }
    }

    fn failed(&self, err: &anyhow::Error) -> FillResult {
        error!("❌ 填写失败: {:#}", err);
        FillResult::from(&FillError::runtime(err))
    }

    /// 依次填写各分区，返回失败条目的描述
    async fn fill_sections(&self, profile: &CandidateProfile) -> Result<Vec<String>> {
        let mut notes = Vec::new();

        BasicInfoFiller::new()
            .fill(&self.doc, profile)
            .await
            .context("basic info")?;
        pause(self.delays.phase).await;

        let controller = RepeatedSectionController::new(self.delays);

        if !profile.experience.is_empty() {
            let outcome = controller
                .fill(&self.doc, &RepeatedSection::EXPERIENCE, &profile.experience)
                .await
                .context("experience")?;
            notes.extend(outcome.failure_notes());
            pause(self.delays.phase).await;
        }

        if !profile.education.is_empty() {
            let outcome = controller
                .fill(&self.doc, &RepeatedSection::EDUCATION, &profile.education)
                .await
                .context("education")?;
            notes.extend(outcome.failure_notes());
            pause(self.delays.phase).await;
        }

        if let Some(uploader) = &self.resume {
            uploader.upload(&self.doc).await;
        }

        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{DomTree, ElementSpec, MemoryDocument};
    use crate::models::{EduEntry, WorkEntry};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    fn filler(doc: MemoryDocument) -> FormFiller<MemoryDocument> {
        FormFiller::new(doc).with_delays(SettleDelays::none())
    }

    fn ada() -> CandidateProfile {
        CandidateProfile {
            first_name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_detect_by_form_id_or_class() {
        let by_id = filler(MemoryDocument::with_body([ElementSpec::form().id(FORM_ID)]));
        assert!(by_id.detect().await.unwrap());

        let by_class = filler(MemoryDocument::with_body([ElementSpec::div().class(FORM_CLASS)]));
        assert!(by_class.detect().await.unwrap());

        // id 对但不是 <form>
        let wrong_tag = filler(MemoryDocument::with_body([ElementSpec::div().id(FORM_ID)]));
        assert!(!wrong_tag.detect().await.unwrap());
    }

    #[tokio::test]
    async fn test_not_target_form_writes_nothing() {
        let filler = filler(MemoryDocument::with_body([
            ElementSpec::form().id("signup"),
            ElementSpec::input("text").id("first_name"),
        ]));

        let result = filler.run(&ada()).await;

        assert_eq!(result, FillResult::failure("Not a Greenhouse application form"));
        assert_eq!(filler.document().write_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_sections_fill_basic_info_only() {
        let filler = filler(MemoryDocument::with_body([ElementSpec::form()
            .id(FORM_ID)
            .children([
                ElementSpec::input("text").id("first_name"),
                ElementSpec::input("email").id("email"),
                ElementSpec::div()
                    .class("experience--container")
                    .child(ElementSpec::button("Add Experience")),
            ])]));

        let result = filler.run(&ada()).await;

        assert_eq!(result, FillResult::success());
        let doc = filler.document();
        assert_eq!(doc.value_of_id("first_name").as_deref(), Some("Ada"));
        assert_eq!(doc.write_count(), 2);
        assert!(doc.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_basic_info_error_becomes_failure() {
        let doc = MemoryDocument::with_body([ElementSpec::form()
            .id(FORM_ID)
            .child(ElementSpec::input("text").id("first_name"))]);
        doc.fail_writes_to(doc.element_by_id("first_name").unwrap());

        let result = filler(doc).run(&ada()).await;

        assert!(!result.success);
        let message = result.message.unwrap();
        assert!(message.starts_with("Error filling form: basic info: setting firstName: "));
        // 返回给调用方的消息保持英文
        assert!(message.is_ascii(), "{}", message);
    }

    #[tokio::test]
    async fn test_entry_error_fails_run_after_remaining_entries() {
        let doc = MemoryDocument::with_body([ElementSpec::form().id(FORM_ID).children([
            ElementSpec::input("text").id("company--0"),
            ElementSpec::input("text").id("company--1"),
            ElementSpec::input("text").id("company--2"),
        ])]);
        doc.fail_writes_to(doc.element_by_id("company--1").unwrap());
        let profile = CandidateProfile {
            experience: vec![
                WorkEntry {
                    company: Some("A".to_string()),
                    ..Default::default()
                },
                WorkEntry {
                    company: Some("B".to_string()),
                    ..Default::default()
                },
                WorkEntry {
                    company: Some("C".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let filler = filler(doc);
        let result = filler.run(&profile).await;

        assert!(!result.success);
        let message = result.message.unwrap();
        assert!(message.starts_with("Error filling form: experience[1]: "));
        assert!(message.contains("setting company"));
        assert!(message.is_ascii(), "{}", message);
        // 失败条目前后的条目都已写入
        let doc = filler.document();
        assert_eq!(doc.value_of_id("company--0").as_deref(), Some("A"));
        assert_eq!(doc.value_of_id("company--2").as_deref(), Some("C"));
    }

    fn assert_at(actual: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(20),
            "期望约 {:?}，实际 {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_delays_between_phases_and_entries() {
        let doc = MemoryDocument::new();
        let form = doc.append_to_root(
            ElementSpec::form()
                .id(FORM_ID)
                .child(ElementSpec::input("text").id("first_name")),
        );
        let experience = doc.append(
            form,
            ElementSpec::div()
                .class("experience--container")
                .child(ElementSpec::input("text").id("company--0")),
        );
        let add = doc.append(experience, ElementSpec::button("Add Experience"));
        doc.append(
            form,
            ElementSpec::div()
                .class("education--container")
                .child(ElementSpec::input("text").id("school--0")),
        );

        let start = Instant::now();
        // 每次点击时记录时间，以及此刻已写入的公司名
        let clicks: Arc<Mutex<Vec<(Duration, Option<String>)>>> = Arc::default();
        let record = Arc::clone(&clicks);
        doc.on_click(
            add,
            Box::new(move |tree: &mut DomTree, count: usize| {
                let previous = tree
                    .element_by_id(&format!("company--{}", count - 1))
                    .and_then(|h| tree.value_of(h));
                record.lock().unwrap().push((start.elapsed(), previous));
                tree.append(
                    experience,
                    ElementSpec::input("text").id(&format!("company--{}", count)),
                );
            }),
        );

        let job = |company: &str| WorkEntry {
            company: Some(company.to_string()),
            ..Default::default()
        };
        let profile = CandidateProfile {
            first_name: Some("Ada".to_string()),
            experience: vec![job("A"), job("B"), job("C")],
            education: vec![EduEntry {
                school: Some("MIT".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let filler = FormFiller::new(doc);
        assert_eq!(filler.delays(), SettleDelays::default());
        let result = filler.run(&profile).await;

        assert_eq!(result, FillResult::success());
        let clicks = clicks.lock().unwrap().clone();
        assert_eq!(clicks.len(), 2);
        // 基本信息后等待 1000ms 才点击；第 i 条填完并等待 500ms 后才点下一次
        assert_at(clicks[0].0, 1000);
        assert_eq!(clicks[0].1.as_deref(), Some("A"));
        assert_at(clicks[1].0, 1500);
        assert_eq!(clicks[1].1.as_deref(), Some("B"));
        // 1000 + 2 × 500 + 工作经历后 1000 + 教育经历后 1000
        assert_at(start.elapsed(), 4000);

        let doc = filler.document();
        assert_eq!(doc.value_of_id("company--2").as_deref(), Some("C"));
        assert_eq!(doc.value_of_id("school--0").as_deref(), Some("MIT"));
    }
}
