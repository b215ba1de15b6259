//! 赋值服务 - 业务能力层
//!
//! 按控件类型写入值并派发合成事件，让页面自身的前端框架感知到变化

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::infrastructure::Document;
use crate::models::{ControlKind, ControlRef, DomEvent, FieldValue};
use crate::utils::logging::truncate_text;

/// 赋值结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// 已写入
    Written,
    /// 单选 / 下拉中没有匹配的选项
    NoMatch,
    /// 该类型不做通用处理（文件、未知类型）
    Unsupported,
}

/// 赋值服务
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSetter;

impl ValueSetter {
    pub fn new() -> Self {
        Self
    }

    pub async fn apply<D: Document>(
        &self,
        doc: &D,
        control: &ControlRef,
        value: &FieldValue,
    ) -> Result<Applied> {
        let handle = control.handle();
        doc.scroll_into_view(handle).await?;

        debug!(
            "写入 {} ({}) <- {}",
            control.describe(),
            control.kind,
            truncate_text(&value.as_text(), 40)
        );

        let applied = match control.kind {
            ControlKind::TextLike | ControlKind::Textarea => {
                doc.set_value(handle, &value.as_text()).await?;
                doc.dispatch_event(handle, DomEvent::Input).await?;
                doc.dispatch_event(handle, DomEvent::Change).await?;
                Applied::Written
            }
            ControlKind::Radio => self.apply_radio(doc, control, value).await?,
            ControlKind::Checkbox => {
                doc.set_checked(handle, value.truthy()).await?;
                doc.dispatch_event(handle, DomEvent::Change).await?;
                Applied::Written
            }
            ControlKind::Date => {
                let raw = value.as_text();
                let written = match value {
                    FieldValue::Text(text) => format_calendar_date(text).unwrap_or(raw),
                    FieldValue::Bool(_) => raw,
                };
                doc.set_value(handle, &written).await?;
                doc.dispatch_event(handle, DomEvent::Change).await?;
                Applied::Written
            }
            ControlKind::Select => self.apply_select(doc, control, value).await?,
            ControlKind::File | ControlKind::Unsupported => {
                debug!("控件 {} 类型为 {}，不做通用处理", control.describe(), control.kind);
                Applied::Unsupported
            }
        };

        Ok(applied)
    }

    /// 同组单选框中选中值相等（忽略大小写）的一项，只对它派发 change
    async fn apply_radio<D: Document>(
        &self,
        doc: &D,
        control: &ControlRef,
        value: &FieldValue,
    ) -> Result<Applied> {
        let Some(name) = control.name() else {
            return Ok(Applied::NoMatch);
        };
        let wanted = value.as_text().to_lowercase();
        let group = doc
            .radio_group(name)
            .await
            .with_context(|| format!("reading radio group {}", name))?;

        match group.iter().find(|radio| radio.value.to_lowercase() == wanted) {
            Some(radio) => {
                doc.set_checked(radio.handle, true).await?;
                doc.dispatch_event(radio.handle, DomEvent::Change).await?;
                Ok(Applied::Written)
            }
            None => {
                debug!("单选组 {} 中没有值为 '{}' 的选项", name, wanted);
                Ok(Applied::NoMatch)
            }
        }
    }

    async fn apply_select<D: Document>(
        &self,
        doc: &D,
        control: &ControlRef,
        value: &FieldValue,
    ) -> Result<Applied> {
        let options = doc.select_options(control).await?;
        let wanted = value.as_text();

        match pick_option(&options, &wanted) {
            Some(option_value) => {
                doc.set_value(control.handle(), &option_value).await?;
                doc.dispatch_event(control.handle(), DomEvent::Change).await?;
                Ok(Applied::Written)
            }
            None => {
                debug!("下拉框 {} 中没有匹配 '{}' 的选项", control.describe(), wanted);
                Ok(Applied::NoMatch)
            }
        }
    }
}

/// 选出下拉框要写入的 option value
///
/// 先找 value 或文字完全相等（忽略大小写）的项，再找包含目标值的第一项
pub fn pick_option(options: &[crate::models::SelectOption], wanted: &str) -> Option<String> {
    let wanted = wanted.to_lowercase();

    options
        .iter()
        .find(|o| o.value.to_lowercase() == wanted || o.label.to_lowercase() == wanted)
        .or_else(|| {
            options.iter().find(|o| {
                o.value.to_lowercase().contains(&wanted) || o.label.to_lowercase().contains(&wanted)
            })
        })
        .map(|o| o.value.clone())
}

/// 解析日期并格式化为 `YYYY-MM-DD`，无法解析时返回 None
pub fn format_calendar_date(text: &str) -> Option<String> {
    parse_calendar_date(text).map(|d| d.format("%Y-%m-%d").to_string())
}

/// 尽量宽松地解析日期；带时区的时间先换算到 UTC 再取日期
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    // 只有年月 / 只有年份时取当月 / 当年第一天
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d") {
        return Some(date);
    }
    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        return text
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ElementSpec, MemoryDocument, Scope};
    use crate::models::SelectOption;

    async fn control_by_id(doc: &MemoryDocument, id: &str) -> ControlRef {
        doc.find_by_id(Scope::Document, id)
            .await
            .unwrap()
            .unwrap()
            .into_control()
    }

    #[tokio::test]
    async fn test_text_dispatches_input_then_change() {
        let doc = MemoryDocument::with_body([ElementSpec::input("email").id("email")]);
        let control = control_by_id(&doc, "email").await;

        let applied = ValueSetter::new()
            .apply(&doc, &control, &FieldValue::from("ada@x.com"))
            .await
            .unwrap();

        assert_eq!(applied, Applied::Written);
        assert_eq!(doc.value_of_id("email").as_deref(), Some("ada@x.com"));
        assert_eq!(
            doc.events_for(control.handle()),
            vec![DomEvent::Input, DomEvent::Change]
        );
        assert_eq!(doc.scrolls(), vec![control.handle()]);
    }

    #[tokio::test]
    async fn test_same_text_twice_still_notifies() {
        let doc = MemoryDocument::with_body([ElementSpec::textarea().id("cover")]);
        let control = control_by_id(&doc, "cover").await;
        let setter = ValueSetter::new();
        let value = FieldValue::from("hello");

        setter.apply(&doc, &control, &value).await.unwrap();
        setter.apply(&doc, &control, &value).await.unwrap();

        assert_eq!(doc.value_of_id("cover").as_deref(), Some("hello"));
        assert_eq!(
            doc.events_for(control.handle()),
            vec![DomEvent::Input, DomEvent::Change, DomEvent::Input, DomEvent::Change]
        );
    }

    #[tokio::test]
    async fn test_radio_selects_case_insensitive_match_only() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("radio").id("g1").name("gender").value("Male"),
            ElementSpec::input("radio").id("g2").name("gender").value("Female"),
        ]);
        let first = control_by_id(&doc, "g1").await;
        let second = doc.element_by_id("g2").unwrap();

        let applied = ValueSetter::new()
            .apply(&doc, &first, &FieldValue::from("female"))
            .await
            .unwrap();

        assert_eq!(applied, Applied::Written);
        assert!(doc.is_checked(second));
        assert!(!doc.is_checked(first.handle()));
        assert!(doc.events_for(first.handle()).is_empty());
        assert_eq!(doc.events_for(second), vec![DomEvent::Change]);
    }

    #[tokio::test]
    async fn test_radio_without_match_is_noop() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("radio").id("g1").name("gender").value("Male"),
        ]);
        let control = control_by_id(&doc, "g1").await;
        let applied = ValueSetter::new()
            .apply(&doc, &control, &FieldValue::from("Other"))
            .await
            .unwrap();
        assert_eq!(applied, Applied::NoMatch);
        assert_eq!(doc.write_count(), 0);
        assert!(doc.events().is_empty());
    }

    #[tokio::test]
    async fn test_checkbox_uses_truthiness() {
        let doc = MemoryDocument::with_body([ElementSpec::input("checkbox").id("current")]);
        let control = control_by_id(&doc, "current").await;
        let setter = ValueSetter::new();

        setter.apply(&doc, &control, &FieldValue::Bool(true)).await.unwrap();
        assert!(doc.is_checked(control.handle()));

        setter.apply(&doc, &control, &FieldValue::from("")).await.unwrap();
        assert!(!doc.is_checked(control.handle()));
        assert_eq!(
            doc.events_for(control.handle()),
            vec![DomEvent::Change, DomEvent::Change]
        );
    }

    #[tokio::test]
    async fn test_date_coercion() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("date").id("start"),
            ElementSpec::input("date").id("end"),
        ]);
        let start = control_by_id(&doc, "start").await;
        let end = control_by_id(&doc, "end").await;
        let setter = ValueSetter::new();

        setter
            .apply(&doc, &start, &FieldValue::from("2021-05-03T10:00:00Z"))
            .await
            .unwrap();
        setter
            .apply(&doc, &end, &FieldValue::from("not-a-date"))
            .await
            .unwrap();

        assert_eq!(doc.value_of_id("start").as_deref(), Some("2021-05-03"));
        assert_eq!(doc.value_of_id("end").as_deref(), Some("not-a-date"));
        assert_eq!(doc.events_for(start.handle()), vec![DomEvent::Change]);
        assert_eq!(doc.events_for(end.handle()), vec![DomEvent::Change]);
    }

    #[tokio::test]
    async fn test_date_non_string_is_written_raw() {
        let doc = MemoryDocument::with_body([ElementSpec::input("date").id("end")]);
        let end = control_by_id(&doc, "end").await;

        ValueSetter::new()
            .apply(&doc, &end, &FieldValue::Bool(true))
            .await
            .unwrap();

        assert_eq!(doc.value_of_id("end").as_deref(), Some("true"));
        assert_eq!(doc.events_for(end.handle()), vec![DomEvent::Change]);
    }

    #[tokio::test]
    async fn test_select_prefers_exact_then_first_containing() {
        let doc = MemoryDocument::with_body([ElementSpec::select()
            .id("country")
            .option("", "Select...")
            .option("US", "United States")
            .option("UK", "United Kingdom")]);
        let control = control_by_id(&doc, "country").await;
        let setter = ValueSetter::new();

        setter.apply(&doc, &control, &FieldValue::from("united")).await.unwrap();
        assert_eq!(doc.value_of_id("country").as_deref(), Some("US"));

        setter.apply(&doc, &control, &FieldValue::from("uk")).await.unwrap();
        assert_eq!(doc.value_of_id("country").as_deref(), Some("UK"));

        let applied = setter
            .apply(&doc, &control, &FieldValue::from("France"))
            .await
            .unwrap();
        assert_eq!(applied, Applied::NoMatch);
        assert_eq!(doc.value_of_id("country").as_deref(), Some("UK"));
    }

    #[tokio::test]
    async fn test_file_and_unknown_inputs_are_left_alone() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("file").id("resume"),
            ElementSpec::input("password").id("pw"),
        ]);
        for id in ["resume", "pw"] {
            let control = control_by_id(&doc, id).await;
            let applied = ValueSetter::new()
                .apply(&doc, &control, &FieldValue::from("x"))
                .await
                .unwrap();
            assert_eq!(applied, Applied::Unsupported);
        }
        assert_eq!(doc.write_count(), 0);
    }

    #[test]
    fn test_pick_option_exact_beats_contains() {
        let options = vec![
            SelectOption::new("united-states", "United States"),
            SelectOption::new("states", "States"),
        ];
        assert_eq!(pick_option(&options, "STATES").as_deref(), Some("states"));
        assert_eq!(pick_option(&options, "nited").as_deref(), Some("united-states"));
        assert_eq!(pick_option(&options, "canada"), None);
    }

    #[test]
    fn test_parse_calendar_date_forms() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_calendar_date("2021-05-03"), d(2021, 5, 3));
        assert_eq!(parse_calendar_date("2021-05-03T23:30:00-05:00"), d(2021, 5, 4));
        assert_eq!(parse_calendar_date("2021-05-03T10:00:00"), d(2021, 5, 3));
        assert_eq!(parse_calendar_date("05/03/2021"), d(2021, 5, 3));
        assert_eq!(parse_calendar_date("May 3, 2021"), d(2021, 5, 3));
        assert_eq!(parse_calendar_date("2021-05"), d(2021, 5, 1));
        assert_eq!(parse_calendar_date("2019"), d(2019, 1, 1));
        assert_eq!(parse_calendar_date("not-a-date"), None);
        assert_eq!(parse_calendar_date(""), None);
    }
}
