//! 条目处理上下文
//!
//! 封装"我正在填写哪个分区的第几条"这一信息

use std::fmt::Display;

/// 重复条目上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCtx {
    /// 分区名（experience / education）
    pub section: &'static str,

    /// 条目序号（从0开始，与页面上 `--{index}` 后缀一致）
    pub index: usize,
}

impl EntryCtx {
    pub fn new(section: &'static str, index: usize) -> Self {
        Self { section, index }
    }

    /// 失败记录里使用的标签，如 `experience[1]`
    pub fn label(&self) -> String {
        format!("{}[{}]", self.section, self.index)
    }
}

impl Display for EntryCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}#{}]", self.section, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_label() {
        let ctx = EntryCtx::new("experience", 1);
        assert_eq!(ctx.to_string(), "[experience#1]");
        assert_eq!(ctx.label(), "experience[1]");
    }
}
