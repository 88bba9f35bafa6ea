//! mvc 工作器
//!
//! 基于叙事、领域模型与用例图生成健壮性（MVC）图，写 state["mvcDiagram"]。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::{ContextRetriever, MvcModeller};
use crate::core::{Context, WorkflowError, KEY_MVC_DIAGRAM, KEY_PLANTUML, KEY_USE_CASE_MODEL};
use crate::workers::registry::{StepOutcome, Worker};

pub struct MvcWorker {
    modeller: Arc<dyn MvcModeller>,
    retriever: Arc<dyn ContextRetriever>,
    top_k: usize,
}

impl MvcWorker {
    pub fn new(
        modeller: Arc<dyn MvcModeller>,
        retriever: Arc<dyn ContextRetriever>,
        top_k: usize,
    ) -> Self {
        Self {
            modeller,
            retriever,
            top_k,
        }
    }
}

#[async_trait]
impl Worker for MvcWorker {
    fn name(&self) -> &str {
        "mvc"
    }

    async fn execute(&self, ctx: &mut Context, _args: &Value) -> Result<StepOutcome, WorkflowError> {
        let narrative = ctx.effective_narrative().to_string();
        let domain_model = ctx
            .state_str(KEY_PLANTUML)
            .filter(|p| !p.trim().is_empty())
            .ok_or(WorkflowError::MissingArtifact {
                key: KEY_PLANTUML,
                hint: "model",
            })?
            .to_string();
        let use_case_model = ctx
            .state_str(KEY_USE_CASE_MODEL)
            .filter(|p| !p.trim().is_empty())
            .ok_or(WorkflowError::MissingArtifact {
                key: KEY_USE_CASE_MODEL,
                hint: "usecase",
            })?
            .to_string();

        let retrieved = self
            .retriever
            .retrieve(&narrative, self.top_k)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!(
            "rag.mvc: fragments={}, vs={}",
            retrieved.fragments, retrieved.vector_store_available
        ));

        let mvc = self
            .modeller
            .generate_mvc_diagram(&narrative, &domain_model, &use_case_model, &retrieved.text)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!("mvc.generate: {} chars", mvc.len()));
        ctx.state
            .insert(KEY_MVC_DIAGRAM.to_string(), Value::String(mvc));
        Ok(StepOutcome::Done)
    }
}
