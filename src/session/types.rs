//! 会话类型与（反）序列化
//!
//! Session 是一次 run 的持久化投影：state / logs / plan 以 JSON 字符串跨越
//! 持久化边界，重载后必须还原成语义相同的映射 / 序列。narrative 列存的是
//! 保存时刻的生效叙事（与原系统一致），重建后的 Context 覆盖槽为空。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Context, WorkflowError};
use crate::plan::Plan;

/// 会话状态；COMPLETED / FAILED 为终态，SUSPENDED_FOR_REVIEW 可重入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Running,
    SuspendedForReview,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Running => "RUNNING",
            WorkflowStatus::SuspendedForReview => "SUSPENDED_FOR_REVIEW",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RUNNING" => Some(WorkflowStatus::Running),
            "SUSPENDED_FOR_REVIEW" => Some(WorkflowStatus::SuspendedForReview),
            "COMPLETED" => Some(WorkflowStatus::Completed),
            "FAILED" => Some(WorkflowStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次 run 的持久化快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub run_id: String,
    /// 保存时刻的生效叙事
    pub narrative: String,
    pub goal: String,
    pub task: String,
    /// ctx.state 的 JSON 序列化
    pub state_json: String,
    /// ctx.logs 的 JSON 序列化
    pub logs_json: String,
    /// Plan 的 JSON 序列化
    pub plan_json: String,
    /// 最近一次尝试的步骤下标（检查点在执行前写入）
    pub current_step_index: usize,
    pub status: WorkflowStatus,
    /// 暂停时的评审载荷（JSON）
    pub review_payload_json: Option<String>,
    /// Save 做 compare-and-swap 的版本号；每次成功保存 +1
    pub version: i64,
    /// RFC 3339
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    /// 新会话外壳；version 取既有会话的值以免同 run_id 重跑时 CAS 失败
    pub fn new_shell(run_id: &str, previous: Option<&Session>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            run_id: run_id.to_string(),
            narrative: String::new(),
            goal: String::new(),
            task: String::new(),
            state_json: "{}".to_string(),
            logs_json: "[]".to_string(),
            plan_json: "{}".to_string(),
            current_step_index: 0,
            status: WorkflowStatus::Running,
            review_payload_json: None,
            version: previous.map(|s| s.version).unwrap_or(0),
            created_at: previous
                .map(|s| s.created_at.clone())
                .unwrap_or_else(|| now.clone()),
            updated_at: now,
        }
    }

    /// 用当前上下文 / 计划 / 进度刷新快照字段（不触碰 version）
    pub fn capture(
        &mut self,
        ctx: &Context,
        plan: &Plan,
        current_step_index: usize,
        status: WorkflowStatus,
        review_payload_json: Option<String>,
    ) -> Result<(), WorkflowError> {
        self.narrative = ctx.effective_narrative().to_string();
        self.goal = ctx.goal.clone();
        self.task = ctx.task.clone();
        self.state_json = serde_json::to_string(&ctx.state)?;
        self.logs_json = serde_json::to_string(&ctx.logs)?;
        self.plan_json = serde_json::to_string(plan)?;
        self.current_step_index = current_step_index;
        self.status = status;
        self.review_payload_json = review_payload_json;
        self.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }

    /// 从快照重建 Context；覆盖槽为空，narrative 即保存时的生效叙事
    pub fn restore_context(&self) -> Result<Context, WorkflowError> {
        let mut ctx = Context::new(&self.run_id, &self.narrative, &self.goal, &self.task);
        ctx.state = serde_json::from_str(&self.state_json)?;
        ctx.logs = serde_json::from_str(&self.logs_json)?;
        Ok(ctx)
    }

    pub fn restore_plan(&self) -> Result<Plan, WorkflowError> {
        Ok(serde_json::from_str(&self.plan_json)?)
    }

    /// 评审载荷解析为 JSON 值（载荷为空或解析失败时返回 None）
    pub fn review_payload(&self) -> Option<Value> {
        self.review_payload_json
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| serde_json::from_str(s).ok())
    }
}

/// 会话列表条目（前端列表用的轻量投影）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub run_id: String,
    pub goal: String,
    pub status: WorkflowStatus,
    pub current_step_index: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        Self {
            run_id: session.run_id.clone(),
            goal: session.goal.clone(),
            status: session.status,
            current_step_index: session.current_step_index,
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanBuilder;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            WorkflowStatus::Running,
            WorkflowStatus::SuspendedForReview,
            WorkflowStatus::Completed,
            WorkflowStatus::Failed,
        ] {
            assert_eq!(WorkflowStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WorkflowStatus::parse("NOPE"), None);
    }

    #[test]
    fn test_capture_restore_round_trip() {
        let mut ctx = Context::new("r1", "base", "goal", "task");
        ctx.override_narrative("effective");
        ctx.state
            .insert("plantuml".to_string(), serde_json::json!("@startuml\n@enduml"));
        ctx.state.insert(
            "issues".to_string(),
            serde_json::json!([{"id": "1", "title": "t", "severity": "minor", "suggestion": "s"}]),
        );
        ctx.log("one");
        ctx.log("two");
        let plan = PlanBuilder::new().build("goal", false);

        let mut session = Session::new_shell("r1", None);
        session
            .capture(&ctx, &plan, 3, WorkflowStatus::SuspendedForReview, None)
            .unwrap();

        let restored = session.restore_context().unwrap();
        // narrative 列折叠为生效叙事
        assert_eq!(restored.effective_narrative(), "effective");
        assert_eq!(restored.state, ctx.state);
        assert_eq!(restored.logs, ctx.logs);
        assert_eq!(session.restore_plan().unwrap(), plan);
    }

    #[test]
    fn test_review_payload_parsing() {
        let mut session = Session::new_shell("r1", None);
        assert!(session.review_payload().is_none());
        session.review_payload_json = Some(r#"{"narrative": "n"}"#.to_string());
        assert_eq!(session.review_payload().unwrap()["narrative"], "n");
    }

    #[test]
    fn test_new_shell_keeps_version_of_previous() {
        let mut prev = Session::new_shell("r1", None);
        prev.version = 7;
        let shell = Session::new_shell("r1", Some(&prev));
        assert_eq!(shell.version, 7);
        assert_eq!(shell.created_at, prev.created_at);
    }
}
