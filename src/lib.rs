//! Iconix - ICONIX 设计工件工作流引擎
//!
//! 模块划分：
//! - **agents**: 生成协作方抽象（叙事 / 建模 / 评审 / 场景写作）与 Mock 实现
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型与运行上下文（Context）
//! - **engine**: 编排器（计划执行主循环、暂停 / 恢复、检查点）与构建器
//! - **observability**: tracing 初始化
//! - **plan**: 计划（Plan / PlanStep）与确定性 PlanBuilder
//! - **session**: 会话持久化（SessionStore 抽象、内存 / SQLite 实现）
//! - **workers**: 工作器（narrative、userReview、model、review、usecase、mvc、scenario）与注册表

pub mod agents;
pub mod config;
pub mod core;
pub mod engine;
pub mod observability;
pub mod plan;
pub mod session;
pub mod workers;

pub use engine::{Orchestrator, OrchestratorBuilder, ResumeRequest, WorkflowRequest, WorkflowResponse};
pub use plan::{Plan, PlanBuilder, PlanStep};
