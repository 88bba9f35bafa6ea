//! review 工作器
//!
//! target=narrative 时评审叙事，写 state["narrativeIssues"]；
//! target=model（默认）时评审领域模型，写 state["issues"] 与扁平化的 state["issuesRaw"]
//! （与 model(refine) 的兜底映射使用同一组键）。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agents::{ContextRetriever, Evaluator};
use crate::core::{
    Context, WorkflowError, KEY_ISSUES, KEY_ISSUES_RAW, KEY_NARRATIVE_ISSUES, KEY_PLANTUML,
};
use crate::workers::registry::{StepOutcome, Worker};

pub struct ReviewWorker {
    evaluator: Arc<dyn Evaluator>,
    retriever: Arc<dyn ContextRetriever>,
    top_k: usize,
}

impl ReviewWorker {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        retriever: Arc<dyn ContextRetriever>,
        top_k: usize,
    ) -> Self {
        Self {
            evaluator,
            retriever,
            top_k,
        }
    }
}

#[async_trait]
impl Worker for ReviewWorker {
    fn name(&self) -> &str {
        "review"
    }

    async fn execute(&self, ctx: &mut Context, args: &Value) -> Result<StepOutcome, WorkflowError> {
        let target = args.get("target").and_then(Value::as_str).unwrap_or("model");
        let narrative = ctx.effective_narrative().to_string();

        let retrieved = self
            .retriever
            .retrieve(&narrative, self.top_k)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!(
            "rag.review: fragments={}, vs={}",
            retrieved.fragments, retrieved.vector_store_available
        ));

        if target.eq_ignore_ascii_case("narrative") {
            let issues = self
                .evaluator
                .evaluate_narrative(&narrative, &retrieved.text)
                .await
                .map_err(WorkflowError::AgentFailed)?;
            ctx.log(format!("review.narrative: issues={}", issues.len()));
            ctx.state
                .insert(KEY_NARRATIVE_ISSUES.to_string(), serde_json::to_value(&issues)?);
            return Ok(StepOutcome::Done);
        }

        let plantuml = ctx
            .state_str(KEY_PLANTUML)
            .filter(|p| !p.trim().is_empty())
            .ok_or(WorkflowError::MissingArtifact {
                key: KEY_PLANTUML,
                hint: "model",
            })?
            .to_string();

        let issues = self
            .evaluator
            .evaluate_domain_model(&narrative, &retrieved.text, &plantuml)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!("review.model: issues={}", issues.len()));

        let raw: Vec<Value> = issues
            .iter()
            .map(|i| {
                json!({
                    "id": i.id,
                    "title": i.title,
                    "severity": i.severity,
                    "suggestion": i.suggestion,
                })
            })
            .collect();

        ctx.state
            .insert(KEY_ISSUES.to_string(), serde_json::to_value(&issues)?);
        ctx.state.insert(KEY_ISSUES_RAW.to_string(), Value::Array(raw));
        Ok(StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentServices;

    fn worker() -> ReviewWorker {
        let agents = AgentServices::mock();
        ReviewWorker::new(agents.evaluator, agents.retriever, 4)
    }

    #[tokio::test]
    async fn test_model_target_requires_plantuml() {
        let mut ctx = Context::new("r1", "n", "g", "");
        let err = worker()
            .execute(&mut ctx, &serde_json::json!({"target": "model"}))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingArtifact { key, .. } if key == KEY_PLANTUML));
    }

    #[tokio::test]
    async fn test_model_target_writes_issues_and_raw() {
        let mut ctx = Context::new("r1", "n", "g", "");
        ctx.state
            .insert(KEY_PLANTUML.to_string(), serde_json::json!("@startuml\n@enduml"));
        worker()
            .execute(&mut ctx, &serde_json::json!({"target": "model"}))
            .await
            .unwrap();
        assert!(ctx.state.contains_key(KEY_ISSUES));
        let raw = ctx.state.get(KEY_ISSUES_RAW).unwrap().as_array().unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw[0].get("suggestion").is_some());
    }

    #[tokio::test]
    async fn test_narrative_target_writes_narrative_issues() {
        let mut ctx = Context::new("r1", "n", "g", "");
        worker()
            .execute(&mut ctx, &serde_json::json!({"target": "narrative"}))
            .await
            .unwrap();
        assert!(ctx.state.contains_key(KEY_NARRATIVE_ISSUES));
        assert!(!ctx.state.contains_key(KEY_ISSUES));
    }
}
