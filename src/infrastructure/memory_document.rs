//! 内存文档 - 基础设施层
//!
//! 一棵最小化的合成 DOM 树，实现 `Document` 能力，并记录所有写入、事件、滚动和点击，
//! 用于在没有浏览器的情况下验证填写逻辑。每个测试应使用独立的实例

use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::FillError;
use crate::infrastructure::document::{AttrQuery, Document, Scope};
use crate::models::{ControlRef, DomEvent, Element, ElementHandle, ResumeFile, SelectOption};

/// 元素描述（构建器）
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    checked: bool,
    hidden: bool,
    options: Vec<SelectOption>,
    children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    pub fn textarea() -> Self {
        Self::new("textarea")
    }

    pub fn select() -> Self {
        Self::new("select")
    }

    pub fn form() -> Self {
        Self::new("form")
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    pub fn label(for_id: &str, text: &str) -> Self {
        Self::new("label").attr("for", for_id).text(text)
    }

    pub fn button(text: &str) -> Self {
        Self::new("button").attr("type", "button").text(text)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn placeholder(self, placeholder: &str) -> Self {
        self.attr("placeholder", placeholder)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn option(mut self, value: &str, label: &str) -> Self {
        self.options.push(SelectOption::new(value, label));
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: String,
    checked: bool,
    visible: bool,
    options: Vec<SelectOption>,
    files: Option<ResumeFile>,
    parent: Option<usize>,
    children: Vec<usize>,
    attached: bool,
}

/// 合成 DOM 树
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    fn new() -> Self {
        let root = Node {
            tag: "#document".to_string(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            checked: false,
            visible: true,
            options: Vec::new(),
            files: None,
            parent: None,
            children: Vec::new(),
            attached: true,
        };
        Self { nodes: vec![root] }
    }

    /// 文档根节点
    pub fn root(&self) -> ElementHandle {
        ElementHandle(0)
    }

    /// 追加子树，返回子树根节点的句柄
    pub fn append(&mut self, parent: ElementHandle, spec: ElementSpec) -> ElementHandle {
        let parent_idx = parent.0 as usize;
        let idx = self.nodes.len();
        let value = spec.value.clone().unwrap_or_else(|| {
            // 下拉框默认选中第一项
            if spec.tag == "select" {
                spec.options.first().map(|o| o.value.clone()).unwrap_or_default()
            } else {
                String::new()
            }
        });
        let attached = self
            .nodes
            .get(parent_idx)
            .map(|p| p.attached)
            .unwrap_or(false);
        self.nodes.push(Node {
            tag: spec.tag,
            attrs: spec.attrs,
            text: spec.text,
            value,
            checked: spec.checked,
            visible: !spec.hidden,
            options: spec.options,
            files: None,
            parent: Some(parent_idx),
            children: Vec::new(),
            attached,
        });
        if let Some(p) = self.nodes.get_mut(parent_idx) {
            p.children.push(idx);
        }
        for child in spec.children {
            self.append(ElementHandle(idx as u64), child);
        }
        ElementHandle(idx as u64)
    }

    /// 把子树移出文档（句柄随之失效）
    pub fn remove(&mut self, handle: ElementHandle) {
        let idx = handle.0 as usize;
        if let Some(parent) = self.nodes.get(idx).and_then(|n| n.parent) {
            self.nodes[parent].children.retain(|c| *c != idx);
        }
        for i in self.subtree(idx) {
            self.nodes[i].attached = false;
        }
    }

    /// 按 id 找句柄（测试断言用）
    pub fn element_by_id(&self, id: &str) -> Option<ElementHandle> {
        self.descendants(0)
            .into_iter()
            .find(|i| self.nodes[*i].attrs.get("id").map(String::as_str) == Some(id))
            .map(|i| ElementHandle(i as u64))
    }

    pub fn value_of(&self, handle: ElementHandle) -> Option<String> {
        self.nodes.get(handle.0 as usize).map(|n| n.value.clone())
    }

    /// 先序遍历（含自身）
    fn subtree(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            out.push(i);
            for child in self.nodes[i].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// 先序遍历（不含自身），即文档顺序
    fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut all = self.subtree(idx);
        all.remove(0);
        all
    }

    fn live(&self, handle: ElementHandle) -> Result<usize> {
        let idx = handle.0 as usize;
        match self.nodes.get(idx) {
            Some(node) if node.attached && idx != 0 => Ok(idx),
            _ => Err(FillError::StaleHandle(handle.0).into()),
        }
    }

    fn scope_root(&self, scope: Scope) -> Result<usize> {
        match scope {
            Scope::Document => Ok(0),
            Scope::Within(handle) => self.live(handle),
        }
    }

    fn text_content(&self, idx: usize) -> String {
        self.subtree(idx)
            .into_iter()
            .map(|i| self.nodes[i].text.as_str())
            .collect()
    }

    fn visible(&self, idx: usize) -> bool {
        let mut cur = Some(idx);
        while let Some(i) = cur {
            if !self.nodes[i].visible {
                return false;
            }
            cur = self.nodes[i].parent;
        }
        true
    }

    fn snapshot(&self, idx: usize) -> Element {
        let node = &self.nodes[idx];
        let input_type = (node.tag == "input").then(|| {
            node.attrs
                .get("type")
                .cloned()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string())
        });
        Element {
            handle: ElementHandle(idx as u64),
            tag: node.tag.clone(),
            input_type,
            attrs: node.attrs.clone(),
            value: node.value.clone(),
            checked: node.checked,
            text: self.text_content(idx),
            visible: self.visible(idx),
        }
    }

    fn find_first(&self, scope: Scope, pred: impl Fn(&Element) -> bool) -> Result<Option<Element>> {
        let root = self.scope_root(scope)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .map(|i| self.snapshot(i))
            .find(|el| pred(el)))
    }
}

/// 已派发的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub handle: ElementHandle,
    pub event: DomEvent,
}

/// 已发生的写入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Value { handle: ElementHandle, value: String },
    Checked { handle: ElementHandle, checked: bool },
    Files { handle: ElementHandle, name: String },
}

/// 点击时执行的动作，参数为该按钮的累计点击次数（从 1 开始）
pub type ClickAction = Box<dyn FnMut(&mut DomTree, usize) + Send>;

struct State {
    tree: DomTree,
    events: Vec<RecordedEvent>,
    writes: Vec<Mutation>,
    scrolls: Vec<ElementHandle>,
    clicks: Vec<ElementHandle>,
    click_actions: HashMap<ElementHandle, ClickAction>,
    failing: HashSet<ElementHandle>,
}

/// 内存中的合成文档
pub struct MemoryDocument {
    state: Mutex<State>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                tree: DomTree::new(),
                events: Vec::new(),
                writes: Vec::new(),
                scrolls: Vec::new(),
                clicks: Vec::new(),
                click_actions: HashMap::new(),
                failing: HashSet::new(),
            }),
        }
    }

    /// 用一组顶层元素构建文档
    pub fn with_body(specs: impl IntoIterator<Item = ElementSpec>) -> Self {
        let doc = Self::new();
        for spec in specs {
            doc.append_to_root(spec);
        }
        doc
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append_to_root(&self, spec: ElementSpec) -> ElementHandle {
        let mut state = self.state();
        let root = state.tree.root();
        state.tree.append(root, spec)
    }

    pub fn append(&self, parent: ElementHandle, spec: ElementSpec) -> ElementHandle {
        self.state().tree.append(parent, spec)
    }

    /// 直接操作树（例如模拟页面自身的重新渲染）
    pub fn with_tree<R>(&self, f: impl FnOnce(&mut DomTree) -> R) -> R {
        f(&mut self.state().tree)
    }

    /// 注册点击动作
    pub fn on_click(&self, handle: ElementHandle, action: ClickAction) {
        self.state().click_actions.insert(handle, action);
    }

    /// 之后对该元素的写入都返回错误
    pub fn fail_writes_to(&self, handle: ElementHandle) {
        self.state().failing.insert(handle);
    }

    // ========== 断言辅助 ==========

    pub fn element_by_id(&self, id: &str) -> Option<ElementHandle> {
        self.state().tree.element_by_id(id)
    }

    pub fn value_of(&self, handle: ElementHandle) -> Option<String> {
        self.state().tree.value_of(handle)
    }

    /// 按 id 取当前值
    pub fn value_of_id(&self, id: &str) -> Option<String> {
        self.element_by_id(id).and_then(|h| self.value_of(h))
    }

    pub fn is_checked(&self, handle: ElementHandle) -> bool {
        self.state()
            .tree
            .nodes
            .get(handle.0 as usize)
            .map(|n| n.checked)
            .unwrap_or(false)
    }

    pub fn files_of(&self, handle: ElementHandle) -> Option<ResumeFile> {
        self.state()
            .tree
            .nodes
            .get(handle.0 as usize)
            .and_then(|n| n.files.clone())
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.state().events.clone()
    }

    pub fn events_for(&self, handle: ElementHandle) -> Vec<DomEvent> {
        self.state()
            .events
            .iter()
            .filter(|e| e.handle == handle)
            .map(|e| e.event)
            .collect()
    }

    pub fn writes(&self) -> Vec<Mutation> {
        self.state().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state().writes.len()
    }

    pub fn scrolls(&self) -> Vec<ElementHandle> {
        self.state().scrolls.clone()
    }

    pub fn clicks(&self) -> Vec<ElementHandle> {
        self.state().clicks.clone()
    }

    pub fn click_count(&self, handle: ElementHandle) -> usize {
        self.state().clicks.iter().filter(|h| **h == handle).count()
    }

    fn write(&self, handle: ElementHandle, mutation: Mutation, apply: impl FnOnce(&mut DomTree, usize)) -> Result<()> {
        let mut state = self.state();
        let idx = state.tree.live(handle)?;
        if state.failing.contains(&handle) {
            return Err(anyhow!("write to element {} rejected", handle));
        }
        apply(&mut state.tree, idx);
        state.writes.push(mutation);
        Ok(())
    }
}

impl Document for MemoryDocument {
    async fn find_by_id(&self, scope: Scope, id: &str) -> Result<Option<Element>> {
        self.state().tree.find_first(scope, |el| el.id() == Some(id))
    }

    async fn find_by_attribute(&self, scope: Scope, query: &AttrQuery) -> Result<Option<Element>> {
        self.state().tree.find_first(scope, |el| query.matches(el))
    }

    async fn find_by_class(&self, scope: Scope, class: &str) -> Result<Option<Element>> {
        self.state().tree.find_first(scope, |el| {
            el.attr("class")
                .map(|c| c.split_whitespace().any(|token| token == class))
                .unwrap_or(false)
        })
    }

    async fn find_all_by_tag(&self, scope: Scope, tag: &str) -> Result<Vec<Element>> {
        let state = self.state();
        let root = state.tree.scope_root(scope)?;
        Ok(state
            .tree
            .descendants(root)
            .into_iter()
            .filter(|i| state.tree.nodes[*i].tag.eq_ignore_ascii_case(tag))
            .map(|i| state.tree.snapshot(i))
            .collect())
    }

    async fn radio_group(&self, name: &str) -> Result<Vec<Element>> {
        let state = self.state();
        Ok(state
            .tree
            .descendants(0)
            .into_iter()
            .map(|i| state.tree.snapshot(i))
            .filter(|el| el.input_type.as_deref() == Some("radio") && el.name() == Some(name))
            .collect())
    }

    async fn select_options(&self, control: &ControlRef) -> Result<Vec<SelectOption>> {
        let state = self.state();
        let idx = state.tree.live(control.handle())?;
        Ok(state.tree.nodes[idx].options.clone())
    }

    async fn scroll_into_view(&self, handle: ElementHandle) -> Result<()> {
        let mut state = self.state();
        state.tree.live(handle)?;
        state.scrolls.push(handle);
        Ok(())
    }

    async fn set_value(&self, handle: ElementHandle, value: &str) -> Result<()> {
        let mutation = Mutation::Value {
            handle,
            value: value.to_string(),
        };
        self.write(handle, mutation, |tree, idx| {
            tree.nodes[idx].value = value.to_string();
        })
    }

    async fn set_checked(&self, handle: ElementHandle, checked: bool) -> Result<()> {
        let mutation = Mutation::Checked { handle, checked };
        self.write(handle, mutation, |tree, idx| {
            // 浏览器语义：选中一个单选框会取消同组其他项
            if checked && tree.nodes[idx].attrs.get("type").map(String::as_str) == Some("radio") {
                let group = tree.nodes[idx].attrs.get("name").cloned();
                for i in tree.descendants(0) {
                    let node = &mut tree.nodes[i];
                    if i != idx
                        && node.attrs.get("type").map(String::as_str) == Some("radio")
                        && node.attrs.get("name") == group.as_ref()
                    {
                        node.checked = false;
                    }
                }
            }
            tree.nodes[idx].checked = checked;
        })
    }

    async fn set_files(&self, handle: ElementHandle, file: &ResumeFile) -> Result<()> {
        let mutation = Mutation::Files {
            handle,
            name: file.name.clone(),
        };
        self.write(handle, mutation, |tree, idx| {
            tree.nodes[idx].files = Some(file.clone());
        })
    }

    async fn dispatch_event(&self, handle: ElementHandle, event: DomEvent) -> Result<()> {
        let mut state = self.state();
        state.tree.live(handle)?;
        state.events.push(RecordedEvent { handle, event });
        Ok(())
    }

    async fn click(&self, handle: ElementHandle) -> Result<()> {
        let mut state = self.state();
        state.tree.live(handle)?;
        state.clicks.push(handle);
        let count = state.clicks.iter().filter(|h| **h == handle).count();
        if let Some(mut action) = state.click_actions.remove(&handle) {
            action(&mut state.tree, count);
            state.click_actions.insert(handle, action);
        }
        Ok(())
    }
}
