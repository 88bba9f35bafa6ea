//! narrative 工作器
//!
//! 以 goal（或 args.description）为唯一用户输入生成叙事，写入叙事覆盖槽。
//! goal 为空时不调用协作方，直接写入固定提示文本。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::{ContextRetriever, NarrativeWriter};
use crate::core::{Context, WorkflowError};
use crate::workers::registry::{StepOutcome, Worker};

const NO_GOAL_MESSAGE: &str =
    "未提供目标或任务描述。请在「目标 / 请求」中输入内容后重新启动 workflow。";

pub struct NarrativeWorker {
    writer: Arc<dyn NarrativeWriter>,
    retriever: Arc<dyn ContextRetriever>,
    top_k: usize,
}

impl NarrativeWorker {
    pub fn new(
        writer: Arc<dyn NarrativeWriter>,
        retriever: Arc<dyn ContextRetriever>,
        top_k: usize,
    ) -> Self {
        Self {
            writer,
            retriever,
            top_k,
        }
    }
}

#[async_trait]
impl Worker for NarrativeWorker {
    fn name(&self) -> &str {
        "narrative"
    }

    async fn execute(&self, ctx: &mut Context, args: &Value) -> Result<StepOutcome, WorkflowError> {
        let description = args
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&ctx.goal)
            .to_string();

        if description.trim().is_empty() {
            tracing::warn!("narrative: empty goal, skipping generation");
            ctx.log("narrative.skipped: goal empty");
            ctx.override_narrative(NO_GOAL_MESSAGE);
            return Ok(StepOutcome::Done);
        }

        let query = if ctx.goal.trim().is_empty() {
            description.clone()
        } else {
            ctx.goal.clone()
        };
        let retrieved = self
            .retriever
            .retrieve(&query, self.top_k)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!(
            "rag.narrative: fragments={}, vs={}",
            retrieved.fragments, retrieved.vector_store_available
        ));

        let generated = self
            .writer
            .compose_narrative(&description, &ctx.goal, &retrieved.text)
            .await
            .map_err(WorkflowError::AgentFailed)?;

        ctx.override_narrative(&generated);
        ctx.log(format!("narrative.generated: chars={}", generated.len()));
        Ok(StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentServices;

    fn worker() -> NarrativeWorker {
        let agents = AgentServices::mock();
        NarrativeWorker::new(agents.narrative_writer, agents.retriever, 4)
    }

    #[tokio::test]
    async fn test_empty_goal_skips_generation() {
        let mut ctx = Context::new("r1", "", "", "");
        let outcome = worker().execute(&mut ctx, &serde_json::json!({})).await.unwrap();
        assert_eq!(outcome, StepOutcome::Done);
        assert_eq!(ctx.effective_narrative(), NO_GOAL_MESSAGE);
        assert!(ctx.logs.iter().any(|l| l.contains("narrative.skipped")));
    }

    #[tokio::test]
    async fn test_generates_and_overrides_narrative() {
        let mut ctx = Context::new("r1", "", "build a shop", "");
        worker().execute(&mut ctx, &serde_json::json!({})).await.unwrap();
        assert!(ctx.effective_narrative().contains("build a shop"));
        assert!(ctx.logs.iter().any(|l| l.starts_with("narrative.generated")));
    }

    #[tokio::test]
    async fn test_description_arg_wins_over_goal() {
        let mut ctx = Context::new("r1", "", "goal text", "");
        worker()
            .execute(&mut ctx, &serde_json::json!({"description": "explicit description"}))
            .await
            .unwrap();
        assert!(ctx.effective_narrative().contains("explicit description"));
    }
}
