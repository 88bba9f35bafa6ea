//! scenario 工作器
//!
//! 流水线末步：基于全部上游工件生成用例场景文本，写 state["scenario"]。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::{ContextRetriever, ScenarioWriter};
use crate::core::{
    Context, WorkflowError, KEY_MVC_DIAGRAM, KEY_PLANTUML, KEY_SCENARIO, KEY_USE_CASE_MODEL,
};
use crate::workers::registry::{StepOutcome, Worker};

pub struct ScenarioWorker {
    writer: Arc<dyn ScenarioWriter>,
    retriever: Arc<dyn ContextRetriever>,
    top_k: usize,
}

impl ScenarioWorker {
    pub fn new(
        writer: Arc<dyn ScenarioWriter>,
        retriever: Arc<dyn ContextRetriever>,
        top_k: usize,
    ) -> Self {
        Self {
            writer,
            retriever,
            top_k,
        }
    }

    fn required(ctx: &Context, key: &'static str, hint: &'static str) -> Result<String, WorkflowError> {
        ctx.state_str(key)
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .ok_or(WorkflowError::MissingArtifact { key, hint })
    }
}

#[async_trait]
impl Worker for ScenarioWorker {
    fn name(&self) -> &str {
        "scenario"
    }

    async fn execute(&self, ctx: &mut Context, _args: &Value) -> Result<StepOutcome, WorkflowError> {
        let narrative = ctx.effective_narrative().to_string();
        let domain_model = Self::required(ctx, KEY_PLANTUML, "model")?;
        let use_case_model = Self::required(ctx, KEY_USE_CASE_MODEL, "usecase")?;
        let mvc_diagram = Self::required(ctx, KEY_MVC_DIAGRAM, "mvc")?;

        let retrieved = self
            .retriever
            .retrieve(&narrative, self.top_k)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!(
            "rag.scenario: fragments={}, vs={}",
            retrieved.fragments, retrieved.vector_store_available
        ));

        let scenario = self
            .writer
            .generate_scenario(
                &narrative,
                &domain_model,
                &use_case_model,
                &mvc_diagram,
                &retrieved.text,
            )
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!("scenario.generate: {} chars", scenario.len()));
        ctx.state
            .insert(KEY_SCENARIO.to_string(), Value::String(scenario));
        Ok(StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentServices;

    fn worker() -> ScenarioWorker {
        let agents = AgentServices::mock();
        ScenarioWorker::new(agents.scenario_writer, agents.retriever, 4)
    }

    #[tokio::test]
    async fn test_requires_all_upstream_artifacts() {
        let mut ctx = Context::new("r1", "n", "g", "");
        ctx.state
            .insert(KEY_PLANTUML.to_string(), serde_json::json!("@startuml\n@enduml"));
        ctx.state
            .insert(KEY_USE_CASE_MODEL.to_string(), serde_json::json!("@startuml\n@enduml"));
        let err = worker().execute(&mut ctx, &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MissingArtifact { hint, .. } if hint == "mvc"));
    }

    #[tokio::test]
    async fn test_writes_scenario() {
        let mut ctx = Context::new("r1", "story", "g", "");
        for key in [KEY_PLANTUML, KEY_USE_CASE_MODEL, KEY_MVC_DIAGRAM] {
            ctx.state
                .insert(key.to_string(), serde_json::json!("@startuml\n@enduml"));
        }
        worker().execute(&mut ctx, &serde_json::json!({})).await.unwrap();
        assert!(ctx.state_str(KEY_SCENARIO).unwrap().contains("story"));
    }
}
