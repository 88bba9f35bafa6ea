//! model 工作器
//!
//! mode=generate（或上下文里还没有 plantuml）时从生效叙事生成领域模型；
//! mode=refine 时按 review 产出的意见修订既有模型。结果写回 state["plantuml"]。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::{ContextRetriever, DomainModeller, Issue};
use crate::core::{Context, WorkflowError, KEY_ISSUES, KEY_ISSUES_RAW, KEY_PLANTUML};
use crate::workers::registry::{StepOutcome, Worker};

pub struct ModelWorker {
    modeller: Arc<dyn DomainModeller>,
    retriever: Arc<dyn ContextRetriever>,
    top_k: usize,
}

impl ModelWorker {
    pub fn new(
        modeller: Arc<dyn DomainModeller>,
        retriever: Arc<dyn ContextRetriever>,
        top_k: usize,
    ) -> Self {
        Self {
            modeller,
            retriever,
            top_k,
        }
    }

    /// 先取结构化的 issues，取不到再从 issuesRaw（Map 列表）映射，缺字段给默认值
    fn issues_from_state(ctx: &Context) -> Vec<Issue> {
        if let Some(value) = ctx.state.get(KEY_ISSUES) {
            if let Ok(issues) = serde_json::from_value::<Vec<Issue>>(value.clone()) {
                return issues;
            }
        }

        let raw = match ctx.state.get(KEY_ISSUES_RAW).and_then(Value::as_array) {
            Some(items) => items,
            None => return Vec::new(),
        };
        raw.iter()
            .map(|item| Issue {
                id: item
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                title: item
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                severity: item
                    .get("severity")
                    .and_then(Value::as_str)
                    .unwrap_or("minor")
                    .to_string(),
                suggestion: item
                    .get("suggestion")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl Worker for ModelWorker {
    fn name(&self) -> &str {
        "model"
    }

    async fn execute(&self, ctx: &mut Context, args: &Value) -> Result<StepOutcome, WorkflowError> {
        let mode = args.get("mode").and_then(Value::as_str).unwrap_or("generate");
        let narrative = ctx.effective_narrative().to_string();
        let existing = ctx.state_str(KEY_PLANTUML).map(str::to_string);

        let retrieved = self
            .retriever
            .retrieve(&narrative, self.top_k)
            .await
            .map_err(WorkflowError::AgentFailed)?;
        ctx.log(format!(
            "rag.model: fragments={}, vs={}",
            retrieved.fragments, retrieved.vector_store_available
        ));

        let generate = mode.eq_ignore_ascii_case("generate")
            || existing.as_deref().map_or(true, |p| p.trim().is_empty());

        let plantuml = if generate {
            let plant = self
                .modeller
                .generate_domain_model(&narrative, &retrieved.text)
                .await
                .map_err(WorkflowError::AgentFailed)?;
            ctx.log(format!("model.generate: {} chars", plant.len()));
            plant
        } else {
            let issues = Self::issues_from_state(ctx);
            let plant = self
                .modeller
                .refine_domain_model(
                    &narrative,
                    existing.as_deref().unwrap_or_default(),
                    &issues,
                    &retrieved.text,
                )
                .await
                .map_err(WorkflowError::AgentFailed)?;
            ctx.log(format!("model.refine: {} chars", plant.len()));
            plant
        };

        ctx.state
            .insert(KEY_PLANTUML.to_string(), Value::String(plantuml));
        Ok(StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentServices;

    fn worker() -> ModelWorker {
        let agents = AgentServices::mock();
        ModelWorker::new(agents.domain_modeller, agents.retriever, 4)
    }

    #[tokio::test]
    async fn test_generate_writes_plantuml() {
        let mut ctx = Context::new("r1", "a narrative", "g", "");
        worker()
            .execute(&mut ctx, &serde_json::json!({"mode": "generate"}))
            .await
            .unwrap();
        assert!(ctx.state_str(KEY_PLANTUML).unwrap().contains("@startuml"));
        assert!(ctx.logs.iter().any(|l| l.starts_with("model.generate")));
    }

    #[tokio::test]
    async fn test_refine_consumes_issues() {
        let mut ctx = Context::new("r1", "a narrative", "g", "");
        ctx.state
            .insert(KEY_PLANTUML.to_string(), serde_json::json!("@startuml\n@enduml"));
        ctx.state.insert(
            KEY_ISSUES.to_string(),
            serde_json::json!([
                {"id": "1", "title": "t", "severity": "major", "suggestion": "s"}
            ]),
        );
        worker()
            .execute(&mut ctx, &serde_json::json!({"mode": "refine"}))
            .await
            .unwrap();
        let plant = ctx.state_str(KEY_PLANTUML).unwrap();
        assert!(plant.contains("1 issues addressed"));
        assert!(ctx.logs.iter().any(|l| l.starts_with("model.refine")));
    }

    #[tokio::test]
    async fn test_refine_without_model_falls_back_to_generate() {
        let mut ctx = Context::new("r1", "a narrative", "g", "");
        worker()
            .execute(&mut ctx, &serde_json::json!({"mode": "refine"}))
            .await
            .unwrap();
        assert!(ctx.logs.iter().any(|l| l.starts_with("model.generate")));
    }

    #[tokio::test]
    async fn test_refine_maps_raw_issues() {
        let mut ctx = Context::new("r1", "a narrative", "g", "");
        ctx.state
            .insert(KEY_PLANTUML.to_string(), serde_json::json!("@startuml\n@enduml"));
        ctx.state.insert(
            KEY_ISSUES_RAW.to_string(),
            serde_json::json!([{"title": "only title"}]),
        );
        worker()
            .execute(&mut ctx, &serde_json::json!({"mode": "refine"}))
            .await
            .unwrap();
        assert!(ctx.state_str(KEY_PLANTUML).unwrap().contains("1 issues addressed"));
    }
}
