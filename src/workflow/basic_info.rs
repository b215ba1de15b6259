//! 基本信息填写流程
//!
//! 按别名表声明顺序逐个字段：取值 → 定位 → 写入。
//! 找不到控件的字段静默跳过，只有页面交互出错才向上返回

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::infrastructure::{Document, Scope};
use crate::models::{CandidateProfile, FieldSource};
use crate::services::{
    plain_aliases, Applied, FieldRequest, FieldResolver, LookupPlan, ValueSetter,
    BASIC_INFO_ALIASES,
};

/// 基本信息填写结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionReport {
    /// 已写入的字段
    pub filled: Vec<&'static str>,
    /// 有值但没写进去的字段（找不到控件或没有匹配选项）
    pub missing: Vec<&'static str>,
}

/// 基本信息填写器
#[derive(Debug, Clone, Copy)]
pub struct BasicInfoFiller {
    resolver: FieldResolver,
    setter: ValueSetter,
}

impl Default for BasicInfoFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicInfoFiller {
    pub fn new() -> Self {
        Self {
            resolver: FieldResolver::new(LookupPlan::BASIC_INFO),
            setter: ValueSetter::new(),
        }
    }

    pub async fn fill<D: Document>(
        &self,
        doc: &D,
        profile: &CandidateProfile,
    ) -> Result<SectionReport> {
        let mut report = SectionReport::default();

        for (logical, aliases) in BASIC_INFO_ALIASES.iter() {
            // 空字符串与缺失同样跳过
            let Some(value) = profile.field(logical).filter(|v| v.truthy()) else {
                continue;
            };

            let aliases = plain_aliases(aliases);
            let request = FieldRequest {
                logical,
                aliases: &aliases,
                scope: Scope::Document,
                index: None,
            };

            let control = self
                .resolver
                .resolve(doc, &request)
                .await
                .with_context(|| format!("locating {}", logical))?;
            let Some(control) = control else {
                report.missing.push(logical);
                continue;
            };

            let applied = self
                .setter
                .apply(doc, &control, &value)
                .await
                .with_context(|| format!("setting {}", logical))?;
            match applied {
                Applied::Written => report.filled.push(logical),
                Applied::NoMatch | Applied::Unsupported => {
                    debug!("字段 {} 未写入: {:?}", logical, applied);
                    report.missing.push(logical);
                }
            }
        }

        info!(
            "✓ 基本信息: 写入 {} 项, 未写入 {} 项",
            report.filled.len(),
            report.missing.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ElementSpec, MemoryDocument};

    fn profile() -> CandidateProfile {
        CandidateProfile {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some(String::new()),
            gender: Some("Female".to_string()),
            city: Some("London".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fills_in_declared_order_and_skips_empty() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("text").id("city"),
            ElementSpec::input("email").name("email_address").id("mail"),
            ElementSpec::input("text").id("first_name"),
            ElementSpec::input("text").id("last_name"),
            ElementSpec::input("tel").id("phone").value("keep"),
        ]);

        let report = BasicInfoFiller::new().fill(&doc, &profile()).await.unwrap();

        assert_eq!(report.filled, ["firstName", "lastName", "email", "city"]);
        assert_eq!(report.missing, ["gender"]);
        assert_eq!(doc.value_of_id("first_name").as_deref(), Some("Ada"));
        assert_eq!(doc.value_of_id("mail").as_deref(), Some("ada@example.com"));
        assert_eq!(doc.value_of_id("phone").as_deref(), Some("keep"));

        let first = doc.element_by_id("first_name").unwrap();
        let city = doc.element_by_id("city").unwrap();
        let scrolls = doc.scrolls();
        let first_pos = scrolls.iter().position(|h| *h == first).unwrap();
        let city_pos = scrolls.iter().position(|h| *h == city).unwrap();
        assert!(first_pos < city_pos);
    }

    #[tokio::test]
    async fn test_gender_radio_and_label_fallback() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("radio").name("gender").value("male"),
            ElementSpec::input("radio").name("gender").value("female").id("gf"),
            ElementSpec::label("q_city", "Current City"),
            ElementSpec::input("text").id("q_city"),
        ]);

        let report = BasicInfoFiller::new().fill(&doc, &profile()).await.unwrap();

        assert!(report.filled.contains(&"gender"));
        assert!(report.filled.contains(&"city"));
        assert!(doc.is_checked(doc.element_by_id("gf").unwrap()));
        assert_eq!(doc.value_of_id("q_city").as_deref(), Some("London"));
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let doc = MemoryDocument::with_body([ElementSpec::input("text").id("first_name")]);
        doc.fail_writes_to(doc.element_by_id("first_name").unwrap());

        let err = BasicInfoFiller::new()
            .fill(&doc, &profile())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("firstName"));
    }
}
