//! usecase 工作器
//!
//! 基于生效叙事与领域模型生成用例图，写 state["useCaseModel"]。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::{ContextRetriever, UseCaseModeller};
use crate::core::{Context, WorkflowError, KEY_PLANTUML, KEY_USE_CASE_MODEL};
use crate::workers::registry::{StepOutcome, Worker};

pub struct UseCaseWorker {
    modeller: Arc<dyn UseCaseModeller>,
    retriever: Arc<dyn ContextRetriever>,
    top_k: usize,
}

impl UseCaseWorker {
    pub fn new(
        modeller: Arc<dyn UseCaseModeller>,
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
impl Worker for UseCaseWorker {
    fn name(&self) -> &str {
        "usecase"
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

        let retrieved = self
            .retriever
            .retrieve(&narrative, self.top_k)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!(
            "rag.usecase: fragments={}, vs={}",
            retrieved.fragments, retrieved.vector_store_available
        ));

        let use_case = self
            .modeller
            .generate_use_case_model(&narrative, &domain_model, &retrieved.text)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!("usecase.generate: {} chars", use_case.len()));
        ctx.state
            .insert(KEY_USE_CASE_MODEL.to_string(), Value::String(use_case));
        Ok(StepOutcome::Done)
    }
}
