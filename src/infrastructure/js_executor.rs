//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识表单 / 候选人资料
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行一段函数体（以 `return` 结束），在页面内 `JSON.stringify` 后再反序列化
    ///
    /// 页面返回 `null` / `undefined` 时 CDP 不带 value 字段，直接 into_value 会失败，
    /// 所以统一转成字符串再解析
    pub async fn eval_json<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
        let js_code = format!("JSON.stringify((() => {{ {} }})() ?? null)", body);
        let raw: String = self
            .page
            .evaluate(js_code)
            .await?
            .into_value()
            .context("page script returned no string")?;
        debug!("页面脚本返回 {} 字节", raw.len());
        let typed_value = serde_json::from_str(&raw)
            .with_context(|| format!("unparseable page script result: {}", raw))?;
        Ok(typed_value)
    }
}
