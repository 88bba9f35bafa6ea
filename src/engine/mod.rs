//! 编排引擎：请求 / 响应类型、主循环与装配

pub mod builder;
pub mod orchestrator;
pub mod types;

pub use builder::OrchestratorBuilder;
pub use orchestrator::Orchestrator;
pub use types::{
    build_core_artifacts, ResumeRequest, WorkflowRequest, WorkflowResponse, ARTIFACT_REVIEW_DATA,
    ARTIFACT_STATUS,
};
