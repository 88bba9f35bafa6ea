//! 引擎出入口类型
//!
//! 运行请求 / 恢复请求 / 响应，以及从 state 构建 artifacts 的投影。
//! `_status` 与 `_reviewData` 是响应中保留的元数据键。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{
    KEY_ISSUES, KEY_MVC_DIAGRAM, KEY_NARRATIVE_ISSUES, KEY_PLANTUML, KEY_SCENARIO,
    KEY_USE_CASE_MODEL,
};
use crate::plan::Plan;

/// artifacts 中的状态键
pub const ARTIFACT_STATUS: &str = "_status";
/// artifacts 中的评审载荷键（仅暂停时存在）
pub const ARTIFACT_REVIEW_DATA: &str = "_reviewData";

/// 启动 workflow 的请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// 未提供时由引擎生成 UUID
    pub run_id: Option<String>,
    pub goal: Option<String>,
    pub narrative: Option<String>,
    pub task: Option<String>,
    /// 已有领域模型时可直接注入 state["plantuml"]
    pub domain_model_override: Option<String>,
    /// 只生成并评审叙事（短计划）；取代原先按 goal 文本猜测的做法
    #[serde(default)]
    pub review_only: bool,
}

/// 暂停后恢复的请求：用户改过的叙事和 / 或领域模型
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub narrative: Option<String>,
    pub domain_model: Option<String>,
}

/// run / resume 的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResponse {
    pub run_id: String,
    pub plan: Plan,
    pub artifacts: Map<String, Value>,
    pub logs: Vec<String>,
}

/// 从 goal / 生效叙事 / state 构建核心工件映射（不含 _status / _reviewData）
pub fn build_core_artifacts(
    goal: &str,
    effective_narrative: &str,
    state: &Map<String, Value>,
) -> Map<String, Value> {
    let mut artifacts = Map::new();
    artifacts.insert("goal".to_string(), Value::String(goal.to_string()));
    artifacts.insert(
        "narrative".to_string(),
        Value::String(effective_narrative.to_string()),
    );
    for key in [
        KEY_PLANTUML,
        KEY_ISSUES,
        KEY_NARRATIVE_ISSUES,
        KEY_USE_CASE_MODEL,
        KEY_MVC_DIAGRAM,
        KEY_SCENARIO,
    ] {
        if let Some(value) = state.get(key) {
            artifacts.insert(key.to_string(), value.clone());
        }
    }
    artifacts
}
