//! 工作流错误类型
//!
//! 引擎在每次传播错误前都会先落盘 Failed 检查点，因此任何失败后
//! 最近一次成功持久化的状态总是可以从 SessionStore 读回。

use thiserror::Error;

/// 工作流执行过程中可能出现的错误（配置错位、会话状态、持久化、协作方失败等）
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// 计划引用了注册表中不存在的工具：计划 / 注册表错位，属编程错误，不重试
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// 仅 SUSPENDED_FOR_REVIEW 状态的会话可以被恢复
    #[error("Session {run_id} is not suspended for review (status: {status})")]
    InvalidResumeState { run_id: String, status: String },

    /// Save 时版本比对失败：另一个调用方已推进了该会话
    #[error("Concurrent modification of session: {0}")]
    ConcurrentModification(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 生成协作方（叙事 / 建模 / 评审等）返回的失败
    #[error("Agent service failed: {0}")]
    AgentFailed(String),

    /// 前置工件缺失（如未先跑 model 就跑 usecase）
    #[error("No {key} in context; run {hint} first")]
    MissingArtifact {
        key: &'static str,
        hint: &'static str,
    },

    #[error("Step timed out: {0}")]
    StepTimeout(String),

    /// 取消：会话停留在最近一次落盘的检查点，可安全重试
    #[error("Cancelled")]
    Cancelled,

    #[error("Store error: {0}")]
    Store(String),
}
