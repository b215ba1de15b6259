//! # Greenhouse Autofill
//!
//! 一个用于自动填写 Greenhouse 求职申请表的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 页面能力抽象，只暴露能力
//! - `Document` - 查找 / 写入 / 派发事件的能力接口
//! - `CdpDocument` - 基于 `JsExecutor`（唯一的 page owner）的真实页面实现
//! - `MemoryDocument` - 内存中的合成文档，用于测试
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个字段
//! - `FieldResolver` - 按别名和策略定位控件
//! - `ValueSetter` - 按控件类型写值并派发事件
//! - `ResumeUploader` - 简历上传
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个分区"的完整填写流程
//! - `BasicInfoFiller` - 基本信息
//! - `RepeatedSectionController` - 工作 / 教育经历（展开、等待、填写）
//! - `EntryCtx` - 上下文封装（分区 + 条目序号）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/form_filler` - 检测表单并调度各分区
//! - `orchestrator/trigger` - `startAutofill` 消息处理
//! - `orchestrator/app` - 管理浏览器资源和应用生命周期
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult, FillError};
pub use infrastructure::{CdpDocument, Document, JsExecutor, MemoryDocument};
pub use models::{CandidateProfile, EduEntry, FillResult, WorkEntry};
pub use orchestrator::{App, FormFiller, TriggerMessage, TriggerResponse};
pub use workflow::{EntryCtx, SettleDelays};
