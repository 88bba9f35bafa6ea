//! userReview 工作器
//!
//! 人工评审关卡：收集当前工件做成评审载荷并返回 Paused。
//! 引擎据此落盘 SUSPENDED_FOR_REVIEW 检查点并把控制权完全交还调用方。

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::core::{Context, WorkflowError, KEY_ISSUES, KEY_NARRATIVE_ISSUES, KEY_PLANTUML};
use crate::workers::registry::{StepOutcome, Worker};

#[derive(Debug, Default)]
pub struct UserReviewWorker;

#[async_trait]
impl Worker for UserReviewWorker {
    fn name(&self) -> &str {
        "userReview"
    }

    async fn execute(
        &self,
        ctx: &mut Context,
        _args: &Value,
    ) -> Result<StepOutcome, WorkflowError> {
        let mut review_data = Map::new();
        review_data.insert(
            "narrative".to_string(),
            Value::String(ctx.effective_narrative().to_string()),
        );
        if let Some(plantuml) = ctx.state.get(KEY_PLANTUML) {
            review_data.insert("domainModel".to_string(), plantuml.clone());
        }
        if let Some(issues) = ctx.state.get(KEY_ISSUES) {
            review_data.insert(KEY_ISSUES.to_string(), issues.clone());
        }
        if let Some(issues) = ctx.state.get(KEY_NARRATIVE_ISSUES) {
            review_data.insert(KEY_NARRATIVE_ISSUES.to_string(), issues.clone());
        }

        ctx.log("userReview: paused for user review");
        Ok(StepOutcome::Paused(Value::Object(review_data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pauses_with_current_artifacts() {
        let mut ctx = Context::new("r1", "base narrative", "g", "");
        ctx.state
            .insert(KEY_PLANTUML.to_string(), serde_json::json!("@startuml\n@enduml"));

        let outcome = UserReviewWorker
            .execute(&mut ctx, &serde_json::json!({}))
            .await
            .unwrap();

        match outcome {
            StepOutcome::Paused(payload) => {
                assert_eq!(payload["narrative"], "base narrative");
                assert_eq!(payload["domainModel"], "@startuml\n@enduml");
                assert!(payload.get(KEY_ISSUES).is_none());
            }
            other => panic!("expected Paused, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_payload_uses_effective_narrative() {
        let mut ctx = Context::new("r1", "original", "g", "");
        ctx.override_narrative("edited");
        let outcome = UserReviewWorker
            .execute(&mut ctx, &serde_json::json!({}))
            .await
            .unwrap();
        match outcome {
            StepOutcome::Paused(payload) => assert_eq!(payload["narrative"], "edited"),
            other => panic!("expected Paused, got {:?}", other),
        }
    }
}
