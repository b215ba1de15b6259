//! 控件模型
//!
//! 定位到的页面元素只是一份快照，句柄不跨阶段缓存（页面在"添加条目"后会重建结构）

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 元素句柄（不透明，由 Document 实现分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// text / email / number / tel / url / hidden
    TextLike,
    Radio,
    Checkbox,
    Date,
    Select,
    Textarea,
    File,
    /// 不处理的控件（password、非表单元素等）
    Unsupported,
}

/// `<input type=...>` 到控件类型的映射
static INPUT_KINDS: phf::Map<&'static str, ControlKind> = phf_map! {
    "text" => ControlKind::TextLike,
    "email" => ControlKind::TextLike,
    "number" => ControlKind::TextLike,
    "tel" => ControlKind::TextLike,
    "url" => ControlKind::TextLike,
    "hidden" => ControlKind::TextLike,
    "radio" => ControlKind::Radio,
    "checkbox" => ControlKind::Checkbox,
    "date" => ControlKind::Date,
    "file" => ControlKind::File,
};

impl ControlKind {
    /// 根据标签名和 input type 判断控件类型
    pub fn classify(tag: &str, input_type: Option<&str>) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "input" => {
                // 没有 type 属性的 input 在浏览器中就是 text
                let ty = input_type
                    .map(|t| t.trim().to_ascii_lowercase())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "text".to_string());
                INPUT_KINDS
                    .get(ty.as_str())
                    .copied()
                    .unwrap_or(ControlKind::Unsupported)
            }
            "textarea" => ControlKind::Textarea,
            "select" => ControlKind::Select,
            _ => ControlKind::Unsupported,
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlKind::TextLike => "text-like",
            ControlKind::Radio => "radio",
            ControlKind::Checkbox => "checkbox",
            ControlKind::Date => "date",
            ControlKind::Select => "select",
            ControlKind::Textarea => "textarea",
            ControlKind::File => "file",
            ControlKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// 元素快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub handle: ElementHandle,
    pub tag: String,
    /// input 的实际 type（浏览器中的 `el.type`）
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// 当前值（`el.value`）
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    /// textContent
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }

    pub fn kind(&self) -> ControlKind {
        let input_type = self.input_type.as_deref().or_else(|| self.attr("type"));
        ControlKind::classify(&self.tag, input_type)
    }

    /// 转为带类型标记的控件引用
    pub fn into_control(self) -> ControlRef {
        let kind = self.kind();
        ControlRef {
            element: self,
            kind,
        }
    }
}

/// 已定位的控件
#[derive(Debug, Clone, PartialEq)]
pub struct ControlRef {
    pub element: Element,
    pub kind: ControlKind,
}

impl ControlRef {
    pub fn handle(&self) -> ElementHandle {
        self.element.handle
    }

    pub fn name(&self) -> Option<&str> {
        self.element.name()
    }

    /// 日志用的简短描述，如 `input#first_name`
    pub fn describe(&self) -> String {
        match (self.element.id(), self.element.name()) {
            (Some(id), _) => format!("{}#{}", self.element.tag, id),
            (None, Some(name)) => format!("{}[name={}]", self.element.tag, name),
            (None, None) => format!("{}{}", self.element.tag, self.element.handle),
        }
    }
}

/// 下拉选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// 合成事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEvent {
    Input,
    Change,
}

impl DomEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
        }
    }
}

/// 待上传的简历文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
