//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次完整填写的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 连接浏览器或启动无头浏览器，持有 Browser
//! - 加载候选人资料，把结果写入日志文件
//!
//! ### `trigger` - 触发消息
//! - `startAutofill` 消息 → `FillResult` 或 `{ error }`
//!
//! ### `form_filler` - 表单填写编排器
//! - 判断是否为 Greenhouse 申请表
//! - 依次调度基本信息、工作经历、教育经历、简历上传
//! - 把任何错误转换为 `FillResult`
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser，加载资料)
//!     ↓
//! trigger (消息 → 响应)
//!     ↓
//! form_filler (检测 + 分区调度)
//!     ↓
//! workflow (BasicInfoFiller / RepeatedSectionController)
//!     ↓
//! services (能力层：resolver / setter / resume)
//!     ↓
//! infrastructure (基础设施：Document / CdpDocument / JsExecutor)
//! ```

pub mod app;
pub mod form_filler;
pub mod trigger;

// 重新导出主要类型
pub use app::App;
pub use form_filler::FormFiller;
pub use trigger::{handle_message, start_autofill, TriggerMessage, TriggerResponse};
