//! 字段定位服务 - 业务能力层
//!
//! 给定逻辑字段名和别名列表，在页面上找到最匹配的控件。
//! 查找策略是一个有序列表，按别名优先、策略其次的顺序依次尝试，第一个命中即返回

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::infrastructure::{AttrQuery, Document, Scope};
use crate::models::ControlRef;

/// 单个查找策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// id 等于别名
    ById,
    /// name 等于别名
    ByName,
    /// name 同时包含别名和条目序号（仅重复条目）
    ByIndexedName,
    /// placeholder 包含别名（下划线换成空格）
    ByPlaceholder,
}

impl Strategy {
    /// 用一个别名尝试本策略
    pub async fn attempt<D: Document>(
        self,
        doc: &D,
        alias: &str,
        scope: Scope,
        index: Option<usize>,
    ) -> Result<Option<ControlRef>> {
        let found = match self {
            Strategy::ById => doc.find_by_id(scope, alias).await?,
            Strategy::ByName => {
                doc.find_by_attribute(scope, &AttrQuery::equals("name", alias))
                    .await?
            }
            Strategy::ByIndexedName => match index {
                Some(i) => {
                    let query =
                        AttrQuery::contains_all("name", vec![alias.to_string(), i.to_string()]);
                    doc.find_by_attribute(scope, &query).await?
                }
                None => None,
            },
            Strategy::ByPlaceholder => {
                let needle = alias.replace('_', " ");
                doc.find_by_attribute(scope, &AttrQuery::contains("placeholder", needle))
                    .await?
            }
        };
        Ok(found.map(|el| el.into_control()))
    }
}

/// 一组查找策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupPlan {
    pub strategies: &'static [Strategy],
    /// 所有别名都失败后，是否按 label 文本兜底
    pub label_fallback: bool,
}

impl LookupPlan {
    /// 基本信息：id → name → placeholder，最后 label 兜底
    pub const BASIC_INFO: LookupPlan = LookupPlan {
        strategies: &[Strategy::ById, Strategy::ByName, Strategy::ByPlaceholder],
        label_fallback: true,
    };

    /// 重复条目：id → name → 带序号的 name
    pub const REPEATED: LookupPlan = LookupPlan {
        strategies: &[Strategy::ById, Strategy::ByName, Strategy::ByIndexedName],
        label_fallback: false,
    };
}

/// 一次定位请求
#[derive(Debug, Clone)]
pub struct FieldRequest<'a> {
    pub logical: &'a str,
    pub aliases: &'a [String],
    pub scope: Scope,
    pub index: Option<usize>,
}

/// 字段定位服务
///
/// 找不到不是错误：返回 `Ok(None)`，调用方静默跳过
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver {
    plan: LookupPlan,
}

impl FieldResolver {
    pub fn new(plan: LookupPlan) -> Self {
        Self { plan }
    }

    pub async fn resolve<D: Document>(
        &self,
        doc: &D,
        request: &FieldRequest<'_>,
    ) -> Result<Option<ControlRef>> {
        for alias in request.aliases {
            for strategy in self.plan.strategies {
                if let Some(control) = strategy
                    .attempt(doc, alias, request.scope, request.index)
                    .await?
                {
                    debug!(
                        "字段 {} 通过 {:?}('{}') 定位到 {}",
                        request.logical,
                        strategy,
                        alias,
                        control.describe()
                    );
                    return Ok(Some(control));
                }
            }
        }

        if self.plan.label_fallback {
            if let Some(control) = resolve_by_label(doc, request.logical).await? {
                debug!(
                    "字段 {} 通过 label 定位到 {}",
                    request.logical,
                    control.describe()
                );
                return Ok(Some(control));
            }
        }

        debug!("字段 {} 未找到对应控件，跳过", request.logical);
        Ok(None)
    }
}

/// camelCase 中的大写字母
static UPPERCASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])").expect("Invalid uppercase regex"));

/// 逻辑字段名转成 label 里可能出现的文字：`firstName` → `first name`
pub fn label_text_for(logical: &str) -> String {
    UPPERCASE_REGEX.replace_all(logical, " $1").to_lowercase()
}

/// 扫描可见的 label，文字包含字段名时按其 `for` 找到控件
async fn resolve_by_label<D: Document>(doc: &D, logical: &str) -> Result<Option<ControlRef>> {
    let wanted = label_text_for(logical);
    let labels = doc.find_all_by_tag(Scope::Document, "label").await?;

    for label in labels.iter().filter(|l| l.visible) {
        if !label.text.to_lowercase().contains(&wanted) {
            continue;
        }
        let Some(target) = label.attr("for").filter(|id| !id.is_empty()) else {
            continue;
        };
        if let Some(el) = doc.find_by_id(Scope::Document, target).await? {
            return Ok(Some(el.into_control()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ElementSpec, MemoryDocument};
    use crate::services::field_aliases::{indexed_aliases, plain_aliases, BASIC_INFO_ALIASES};

    fn basic_request<'a>(logical: &'a str, aliases: &'a [String]) -> FieldRequest<'a> {
        FieldRequest {
            logical,
            aliases,
            scope: Scope::Document,
            index: None,
        }
    }

    fn first_name_aliases() -> Vec<String> {
        plain_aliases(BASIC_INFO_ALIASES.aliases("firstName").unwrap())
    }

    #[tokio::test]
    async fn test_first_alias_by_id_wins() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("text").name("first_name").id("by-name"),
            ElementSpec::input("text").placeholder("Your first name").id("by-placeholder"),
            ElementSpec::input("text").id("first_name"),
        ]);
        let aliases = first_name_aliases();
        let resolver = FieldResolver::new(LookupPlan::BASIC_INFO);

        let control = resolver
            .resolve(&doc, &basic_request("firstName", &aliases))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(control.element.id(), Some("first_name"));
    }

    #[tokio::test]
    async fn test_alias_order_beats_strategy_order() {
        // 第一个别名的 name 命中，优先于第二个别名的 id 命中
        let doc = MemoryDocument::with_body([
            ElementSpec::input("text").id("firstName"),
            ElementSpec::input("text").name("first_name").id("x"),
        ]);
        let aliases = first_name_aliases();
        let control = FieldResolver::new(LookupPlan::BASIC_INFO)
            .resolve(&doc, &basic_request("firstName", &aliases))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(control.element.id(), Some("x"));
    }

    #[tokio::test]
    async fn test_placeholder_replaces_underscores() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("tel").placeholder("Enter phone number").id("p"),
        ]);
        let aliases = vec!["phone_number".to_string()];
        let control = FieldResolver::new(LookupPlan::BASIC_INFO)
            .resolve(&doc, &basic_request("phone", &aliases))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(control.element.id(), Some("p"));
    }

    #[tokio::test]
    async fn test_label_fallback() {
        let doc = MemoryDocument::with_body([
            ElementSpec::label("question_1", "Hidden First Name").hidden(),
            ElementSpec::label("question_2", "LinkedIn Profile"),
            ElementSpec::label("question_3", "Legal First Name *"),
            ElementSpec::input("text").id("question_3"),
        ]);
        let aliases = vec!["nothing_matches".to_string()];
        let control = FieldResolver::new(LookupPlan::BASIC_INFO)
            .resolve(&doc, &basic_request("firstName", &aliases))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(control.element.id(), Some("question_3"));
    }

    #[tokio::test]
    async fn test_repeated_plan_never_uses_labels_or_placeholders() {
        let doc = MemoryDocument::with_body([
            ElementSpec::label("c", "Company"),
            ElementSpec::input("text").id("c").placeholder("company"),
        ]);
        let aliases = indexed_aliases(&["company"], 0);
        let request = FieldRequest {
            logical: "company",
            aliases: &aliases,
            scope: Scope::Document,
            index: Some(0),
        };
        let found = FieldResolver::new(LookupPlan::REPEATED)
            .resolve(&doc, &request)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_indexed_name_needs_alias_and_index() {
        let doc = MemoryDocument::with_body([
            ElementSpec::input("text").name("job_application[employments][0][company]"),
            ElementSpec::input("text").name("job_application[employments][1][company]"),
        ]);
        let aliases = indexed_aliases(&["company"], 1);
        let request = FieldRequest {
            logical: "company",
            aliases: &aliases,
            scope: Scope::Document,
            index: Some(1),
        };
        let control = FieldResolver::new(LookupPlan::REPEATED)
            .resolve(&doc, &request)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            control.name(),
            Some("job_application[employments][1][company]")
        );
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let doc = MemoryDocument::new();
        let aliases = first_name_aliases();
        let found = FieldResolver::new(LookupPlan::BASIC_INFO)
            .resolve(&doc, &basic_request("firstName", &aliases))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_label_text_for() {
        assert_eq!(label_text_for("firstName"), "first name");
        assert_eq!(label_text_for("linkedin"), "linkedin");
        assert_eq!(label_text_for("startDate"), "start date");
    }
}
