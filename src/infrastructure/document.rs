//! 文档能力接口 - 基础设施层
//!
//! 引擎只通过这组能力访问页面，不关心背后是真实浏览器还是内存中的合成文档

use anyhow::Result;
use serde::Serialize;

use crate::models::{ControlRef, DomEvent, Element, ElementHandle, ResumeFile, SelectOption};

/// 查找范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// 整个文档
    Document,
    /// 某个容器元素内部（不含容器本身）
    Within(ElementHandle),
}

impl Scope {
    pub fn root_handle(&self) -> Option<ElementHandle> {
        match self {
            Scope::Document => None,
            Scope::Within(handle) => Some(*handle),
        }
    }
}

/// 属性匹配方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "needles", rename_all = "camelCase")]
pub enum AttrPattern {
    /// `[attr="v"]`
    Equals(String),
    /// `[attr*="v"]`
    Contains(String),
    /// `[attr*="a"][attr*="b"]...`
    ContainsAll(Vec<String>),
}

impl AttrPattern {
    /// 判断属性值是否匹配（大小写敏感，与 CSS 属性选择器一致）
    pub fn matches(&self, value: &str) -> bool {
        match self {
            AttrPattern::Equals(v) => value == v,
            AttrPattern::Contains(v) => value.contains(v.as_str()),
            AttrPattern::ContainsAll(vs) => vs.iter().all(|v| value.contains(v.as_str())),
        }
    }
}

/// 属性查询
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttrQuery {
    /// 限定标签名（小写），None 表示任意元素
    pub tag: Option<String>,
    pub attr: String,
    pub pattern: AttrPattern,
}

impl AttrQuery {
    pub fn equals(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: None,
            attr: attr.into(),
            pattern: AttrPattern::Equals(value.into()),
        }
    }

    pub fn contains(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: None,
            attr: attr.into(),
            pattern: AttrPattern::Contains(value.into()),
        }
    }

    pub fn contains_all(attr: impl Into<String>, needles: Vec<String>) -> Self {
        Self {
            tag: None,
            attr: attr.into(),
            pattern: AttrPattern::ContainsAll(needles),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into().to_ascii_lowercase());
        self
    }

    /// 判断一个元素快照是否满足查询
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        element
            .attr(&self.attr)
            .map(|v| self.pattern.matches(v))
            .unwrap_or(false)
    }
}

/// 页面文档能力
///
/// 所有查找都按文档顺序返回第一个命中；写操作不自动派发事件，由调用方决定
#[allow(async_fn_in_trait)]
pub trait Document {
    /// 按 id 查找
    async fn find_by_id(&self, scope: Scope, id: &str) -> Result<Option<Element>>;

    /// 按属性查找
    async fn find_by_attribute(&self, scope: Scope, query: &AttrQuery) -> Result<Option<Element>>;

    /// 按 class 查找
    async fn find_by_class(&self, scope: Scope, class: &str) -> Result<Option<Element>>;

    /// 按标签名查找全部
    async fn find_all_by_tag(&self, scope: Scope, tag: &str) -> Result<Vec<Element>>;

    /// 同名的所有单选框（整个文档）
    async fn radio_group(&self, name: &str) -> Result<Vec<Element>>;

    /// 下拉框的所有选项
    async fn select_options(&self, control: &ControlRef) -> Result<Vec<SelectOption>>;

    /// 滚动到视口中央
    async fn scroll_into_view(&self, handle: ElementHandle) -> Result<()>;

    /// 写入 value
    async fn set_value(&self, handle: ElementHandle, value: &str) -> Result<()>;

    /// 写入 checked
    async fn set_checked(&self, handle: ElementHandle, checked: bool) -> Result<()>;

    /// 给文件输入框设置文件
    async fn set_files(&self, handle: ElementHandle, file: &ResumeFile) -> Result<()>;

    /// 派发冒泡的合成事件
    async fn dispatch_event(&self, handle: ElementHandle, event: DomEvent) -> Result<()>;

    /// 模拟点击
    async fn click(&self, handle: ElementHandle) -> Result<()>;
}
