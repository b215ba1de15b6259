//! 重复分区填写流程（工作经历 / 教育经历）
//!
//! 第 0 条直接填写；之后每一条先点"添加"按钮、等待页面稳定，再填写。
//! 没有添加按钮时直接按序号填写。单条失败只记录，后续条目照常进行

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::infrastructure::{Document, Scope};
use crate::models::{ControlKind, DomEvent, Element, FieldSource, FieldValue};
use crate::services::{
    indexed_aliases, FieldAliasTable, FieldRequest, FieldResolver, LookupPlan, ValueSetter,
    EDUCATION_ALIASES, EXPERIENCE_ALIASES,
};
use crate::workflow::entry_ctx::EntryCtx;
use crate::workflow::settle::{pause, wait_until, SettleDelays};

/// 直接勾选而不走通用赋值的字段
const CURRENT_FIELD: &str = "current";

/// 一个可重复的分区
#[derive(Debug, Clone, Copy)]
pub struct RepeatedSection {
    pub key: &'static str,
    /// 分区容器的 class
    pub container_class: &'static str,
    /// 添加按钮文字中可能出现的短语（小写）
    pub add_phrases: &'static [&'static str],
    pub aliases: FieldAliasTable,
}

impl RepeatedSection {
    pub const EXPERIENCE: RepeatedSection = RepeatedSection {
        key: "experience",
        container_class: "experience--container",
        add_phrases: &["add experience", "add another position"],
        aliases: EXPERIENCE_ALIASES,
    };

    pub const EDUCATION: RepeatedSection = RepeatedSection {
        key: "education",
        container_class: "education--container",
        add_phrases: &["add education", "add another"],
        aliases: EDUCATION_ALIASES,
    };

    fn is_add_button(&self, button: &Element) -> bool {
        let text = button.text.to_lowercase();
        self.add_phrases.iter().any(|phrase| text.contains(phrase))
    }
}

/// 分区填写状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionState {
    Idle,
    Filling(usize),
    Expanding(usize),
    Done,
}

/// 分区填写结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionOutcome {
    /// 成功填写的条目数
    pub entries_filled: usize,
    /// 写入的字段总数
    pub fields_filled: usize,
    /// 失败的条目及错误信息
    pub failed: Vec<(EntryCtx, String)>,
}

impl SectionOutcome {
    /// 失败描述，如 `experience[1]: ...`
    pub fn failure_notes(&self) -> Vec<String> {
        self.failed
            .iter()
            .map(|(ctx, message)| format!("{}: {}", ctx.label(), message))
            .collect()
    }
}

/// 重复分区控制器
#[derive(Debug, Clone, Copy)]
pub struct RepeatedSectionController {
    delays: SettleDelays,
    resolver: FieldResolver,
    setter: ValueSetter,
}

impl RepeatedSectionController {
    pub fn new(delays: SettleDelays) -> Self {
        Self {
            delays,
            resolver: FieldResolver::new(LookupPlan::REPEATED),
            setter: ValueSetter::new(),
        }
    }

    pub async fn fill<D: Document, E: FieldSource>(
        &self,
        doc: &D,
        section: &RepeatedSection,
        entries: &[E],
    ) -> Result<SectionOutcome> {
        let mut outcome = SectionOutcome::default();
        if entries.is_empty() {
            return Ok(outcome);
        }

        let container = doc
            .find_by_class(Scope::Document, section.container_class)
            .await
            .with_context(|| format!("finding .{}", section.container_class))?;
        let scope = container
            .as_ref()
            .map(|c| Scope::Within(c.handle))
            .unwrap_or(Scope::Document);
        let add_button = match &container {
            Some(c) => doc
                .find_all_by_tag(Scope::Within(c.handle), "button")
                .await?
                .into_iter()
                .find(|b| section.is_add_button(b)),
            None => None,
        };
        debug!(
            "分区 {}: 容器 {}, 添加按钮 {}",
            section.key,
            if container.is_some() { "存在" } else { "不存在" },
            add_button
                .as_ref()
                .map(|b| b.handle.to_string())
                .unwrap_or_else(|| "无".to_string())
        );

        let mut state = SectionState::Idle;
        loop {
            state = match state {
                SectionState::Idle => SectionState::Filling(0),
                SectionState::Expanding(i) => {
                    let ctx = EntryCtx::new(section.key, i);
                    let expanded = self
                        .expand(doc, section, scope, &entries[i], ctx, add_button.as_ref())
                        .await;
                    match expanded {
                        Ok(()) => SectionState::Filling(i),
                        Err(e) => {
                            warn!("{} ⚠️ 展开新条目失败: {:#}", ctx, e);
                            outcome.failed.push((ctx, format!("{:#}", e)));
                            next_state(i + 1, entries.len(), add_button.is_some())
                        }
                    }
                }
                SectionState::Filling(i) => {
                    let ctx = EntryCtx::new(section.key, i);
                    match self.fill_entry(doc, section, scope, &entries[i], ctx).await {
                        Ok(fields) => {
                            debug!("{} 写入 {} 个字段", ctx, fields);
                            outcome.entries_filled += 1;
                            outcome.fields_filled += fields;
                        }
                        Err(e) => {
                            warn!("{} ⚠️ 填写失败: {:#}", ctx, e);
                            outcome.failed.push((ctx, format!("{:#}", e)));
                        }
                    }
                    next_state(i + 1, entries.len(), add_button.is_some())
                }
                SectionState::Done => break,
            };
            debug!("分区 {} 状态 → {:?}", section.key, state);
        }

        info!(
            "✓ 分区 {}: 成功 {}/{} 条",
            section.key,
            outcome.entries_filled,
            entries.len()
        );
        Ok(outcome)
    }

    /// 点击添加按钮并等待新条目出现
    async fn expand<D: Document, E: FieldSource>(
        &self,
        doc: &D,
        section: &RepeatedSection,
        scope: Scope,
        entry: &E,
        ctx: EntryCtx,
        add_button: Option<&Element>,
    ) -> Result<()> {
        let Some(button) = add_button else {
            return Ok(());
        };

        debug!("{} 点击添加按钮 {}", ctx, button.handle);
        doc.click(button.handle)
            .await
            .with_context(|| format!("clicking add button {}", button.handle))?;
        pause(self.delays.entry).await;

        if self.delays.polls() {
            let ready = wait_until(
                self.delays.entry_poll_timeout,
                self.delays.entry_poll_interval,
                || self.entry_ready(doc, section, scope, entry, ctx),
            )
            .await;
            if !ready {
                debug!("{} 等待新字段超时，继续填写", ctx);
            }
        }
        Ok(())
    }

    /// 条目的任一字段已能定位即视为就绪
    async fn entry_ready<D: Document, E: FieldSource>(
        &self,
        doc: &D,
        section: &RepeatedSection,
        scope: Scope,
        entry: &E,
        ctx: EntryCtx,
    ) -> Result<bool> {
        for (logical, aliases) in section.aliases.iter() {
            if entry.field(logical).is_none() {
                continue;
            }
            let aliases = indexed_aliases(aliases, ctx.index);
            let request = FieldRequest {
                logical,
                aliases: &aliases,
                scope,
                index: Some(ctx.index),
            };
            if self.resolver.resolve(doc, &request).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 填写一条，返回写入的字段数
    async fn fill_entry<D: Document, E: FieldSource>(
        &self,
        doc: &D,
        section: &RepeatedSection,
        scope: Scope,
        entry: &E,
        ctx: EntryCtx,
    ) -> Result<usize> {
        let mut written = 0;

        for (logical, aliases) in section.aliases.iter() {
            // 只要有值就填写，空字符串也算
            let Some(value) = entry.field(logical) else {
                continue;
            };

            let aliases = indexed_aliases(aliases, ctx.index);
            let request = FieldRequest {
                logical,
                aliases: &aliases,
                scope,
                index: Some(ctx.index),
            };
            let Some(control) = self
                .resolver
                .resolve(doc, &request)
                .await
                .with_context(|| format!("locating {}", logical))?
            else {
                debug!("{} 字段 {} 未找到，跳过", ctx, logical);
                continue;
            };

            if logical == CURRENT_FIELD && control.kind == ControlKind::Checkbox {
                set_current_flag(doc, &control.element, &value)
                    .await
                    .with_context(|| format!("setting {}", logical))?;
                written += 1;
                continue;
            }

            self.setter
                .apply(doc, &control, &value)
                .await
                .with_context(|| format!("setting {}", logical))?;
            written += 1;
        }

        Ok(written)
    }
}

fn next_state(next: usize, total: usize, has_button: bool) -> SectionState {
    if next >= total {
        SectionState::Done
    } else if has_button {
        SectionState::Expanding(next)
    } else {
        SectionState::Filling(next)
    }
}

/// "目前在职"复选框直接勾选
async fn set_current_flag<D: Document>(doc: &D, checkbox: &Element, value: &FieldValue) -> Result<()> {
    doc.set_checked(checkbox.handle, value.truthy()).await?;
    doc.dispatch_event(checkbox.handle, DomEvent::Change).await
}
