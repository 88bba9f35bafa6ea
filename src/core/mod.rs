//! 核心层：错误类型与运行上下文

pub mod context;
pub mod error;

pub use context::{
    Context, KEY_ISSUES, KEY_ISSUES_RAW, KEY_MVC_DIAGRAM, KEY_NARRATIVE_ISSUES, KEY_PLANTUML,
    KEY_SCENARIO, KEY_USE_CASE_MODEL,
};
pub use error::WorkflowError;
