use serde::{Deserialize, Serialize};

use crate::error::FillError;

/// 一次自动填写的最终结果
///
/// 不区分部分成功：任何阶段出错都会整体失败，但已写入的字段不回滚
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FillResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl From<&FillError> for FillResult {
    fn from(err: &FillError) -> Self {
        FillResult::failure(err.to_string())
    }
}
