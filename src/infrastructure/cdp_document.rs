//! CDP 文档 - 基础设施层
//!
//! 通过 JsExecutor 在真实页面里执行小段脚本来实现 `Document` 能力。
//! 元素登记在页面侧的 WeakMap 里，递增计数作为句柄；元素被移出文档后句柄失效

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::infrastructure::document::{AttrQuery, Document, Scope};
use crate::infrastructure::JsExecutor;
use crate::models::{ControlRef, DomEvent, Element, ElementHandle, ResumeFile, SelectOption};

/// 每段脚本前面的公共函数
const PRELUDE: &str = r#"
    const reg = window.__greenhouseAutofillRefs
        || (window.__greenhouseAutofillRefs = { ids: new WeakMap(), refs: new Map(), next: 0 });
    const handleOf = (el) => {
        let h = reg.ids.get(el);
        if (h === undefined) {
            h = reg.next++;
            reg.ids.set(el, h);
            reg.refs.set(h, new WeakRef(el));
        }
        return h;
    };
    const byHandle = (h) => {
        const ref = reg.refs.get(h);
        const el = ref && ref.deref();
        if (!el || !el.isConnected) {
            reg.refs.delete(h);
            throw new Error('stale element handle ' + h);
        }
        return el;
    };
    const rootOf = (h) => h === null ? document : byHandle(h);
    const snap = (el) => el ? ({
        handle: handleOf(el),
        tag: el.tagName.toLowerCase(),
        inputType: el.tagName === 'INPUT' ? (el.type || 'text') : null,
        attrs: Object.fromEntries(Array.from(el.attributes).map(a => [a.name, a.value])),
        value: ('value' in el && el.value != null) ? String(el.value) : '',
        checked: !!el.checked,
        text: el.textContent || '',
        visible: !!(el.offsetParent || el.getClientRects().length),
    }) : null;
"#;

/// 基于 CDP 的页面文档
pub struct CdpDocument {
    executor: JsExecutor,
}

impl CdpDocument {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    async fn run<T: serde::de::DeserializeOwned>(&self, op: &str, body: String) -> Result<T> {
        let script = format!("{}\n{}", PRELUDE, body);
        self.executor
            .eval_json(&script)
            .await
            .with_context(|| format!("page operation {}", op))
    }

    /// 对单个元素执行写操作
    async fn mutate(&self, op: &str, handle: ElementHandle, statement: String) -> Result<()> {
        debug!("页面操作 {} -> 元素 {}", op, handle);
        let body = format!(
            "const el = byHandle({}); {}; return true;",
            handle.0, statement
        );
        let _: bool = self.run(op, body).await?;
        Ok(())
    }
}

/// 序列化为 JS 字面量
fn js<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn scope_literal(scope: Scope) -> String {
    match scope.root_handle() {
        Some(handle) => handle.0.to_string(),
        None => "null".to_string(),
    }
}

impl Document for CdpDocument {
    async fn find_by_id(&self, scope: Scope, id: &str) -> Result<Option<Element>> {
        let body = format!(
            r#"
            const root = rootOf({scope});
            const id = {id};
            const el = root === document
                ? document.getElementById(id)
                : root.querySelector('#' + CSS.escape(id));
            return snap(el);
            "#,
            scope = scope_literal(scope),
            id = js(id)?,
        );
        self.run("find_by_id", body).await
    }

    async fn find_by_attribute(&self, scope: Scope, query: &AttrQuery) -> Result<Option<Element>> {
        let body = format!(
            r#"
            const q = {query};
            const needles = Array.isArray(q.pattern.needles) ? q.pattern.needles : [q.pattern.needles];
            const ok = (v) => v !== null && (q.pattern.mode === 'equals'
                ? v === needles[0]
                : needles.every(n => v.includes(n)));
            const sel = (q.tag || '') + '[' + CSS.escape(q.attr) + ']';
            const el = Array.from(rootOf({scope}).querySelectorAll(sel))
                .find(el => ok(el.getAttribute(q.attr)));
            return snap(el || null);
            "#,
            query = js(query)?,
            scope = scope_literal(scope),
        );
        self.run("find_by_attribute", body).await
    }

    async fn find_by_class(&self, scope: Scope, class: &str) -> Result<Option<Element>> {
        let body = format!(
            "return snap(rootOf({}).querySelector('.' + CSS.escape({})));",
            scope_literal(scope),
            js(class)?
        );
        self.run("find_by_class", body).await
    }

    async fn find_all_by_tag(&self, scope: Scope, tag: &str) -> Result<Vec<Element>> {
        let body = format!(
            "return Array.from(rootOf({}).getElementsByTagName({})).map(snap);",
            scope_literal(scope),
            js(tag)?
        );
        self.run("find_all_by_tag", body).await
    }

    async fn radio_group(&self, name: &str) -> Result<Vec<Element>> {
        let body = format!(
            r#"
            const name = {};
            return Array.from(document.querySelectorAll('input[type="radio"]'))
                .filter(el => el.name === name)
                .map(snap);
            "#,
            js(name)?
        );
        self.run("radio_group", body).await
    }

    async fn select_options(&self, control: &ControlRef) -> Result<Vec<SelectOption>> {
        let body = format!(
            "return Array.from(byHandle({}).options || []).map(o => ({{ value: o.value, label: o.text }}));",
            control.handle().0
        );
        self.run("select_options", body).await
    }

    async fn scroll_into_view(&self, handle: ElementHandle) -> Result<()> {
        self.mutate(
            "scroll_into_view",
            handle,
            "el.scrollIntoView({ behavior: 'smooth', block: 'center' })".to_string(),
        )
        .await
    }

    async fn set_value(&self, handle: ElementHandle, value: &str) -> Result<()> {
        self.mutate("set_value", handle, format!("el.value = {}", js(value)?))
            .await
    }

    async fn set_checked(&self, handle: ElementHandle, checked: bool) -> Result<()> {
        self.mutate("set_checked", handle, format!("el.checked = {}", checked))
            .await
    }

    async fn set_files(&self, handle: ElementHandle, file: &ResumeFile) -> Result<()> {
        let statement = format!(
            r#"
            const file = new File([new Uint8Array({bytes})], {name}, {{ type: {mime} }});
            const dt = new DataTransfer();
            dt.items.add(file);
            el.files = dt.files
            "#,
            bytes = js(&file.bytes)?,
            name = js(&file.name)?,
            mime = js(&file.mime_type)?,
        );
        self.mutate("set_files", handle, statement).await
    }

    async fn dispatch_event(&self, handle: ElementHandle, event: DomEvent) -> Result<()> {
        self.mutate(
            "dispatch_event",
            handle,
            format!(
                "el.dispatchEvent(new Event({}, {{ bubbles: true }}))",
                js(event.as_str())?
            ),
        )
        .await
    }

    async fn click(&self, handle: ElementHandle) -> Result<()> {
        self.mutate("click", handle, "el.click()".to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_literals_are_escaped() {
        assert_eq!(js("a\"b").unwrap(), r#""a\"b""#);
        assert_eq!(js(&vec![1u8, 2, 255]).unwrap(), "[1,2,255]");
    }

    #[test]
    fn test_scope_literal() {
        assert_eq!(scope_literal(Scope::Document), "null");
        assert_eq!(scope_literal(Scope::Within(ElementHandle(7))), "7");
    }

    #[test]
    fn test_registry_does_not_pin_elements() {
        // 按元素查句柄走 WeakMap，不做线性查找，也不强引用已移除的元素
        assert!(PRELUDE.contains("new WeakMap()"));
        assert!(PRELUDE.contains("new WeakRef(el)"));
        assert!(!PRELUDE.contains("indexOf"));
    }
}
