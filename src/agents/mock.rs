//! Mock 协作方（用于测试，无需外部服务）
//!
//! 输出是输入的确定性函数：相同输入得到相同工件，便于断言与离线跑通整条流水线。

use async_trait::async_trait;

use crate::agents::traits::{
    ContextRetriever, DomainModeller, Evaluator, Issue, MvcModeller, NarrativeWriter,
    RetrievedContext, ScenarioWriter, UseCaseModeller,
};

/// 全能 Mock：实现全部协作方 trait
#[derive(Debug, Default)]
pub struct MockAgents;

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect()
    } else {
        text.to_string()
    }
}

#[async_trait]
impl ContextRetriever for MockAgents {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<RetrievedContext, String> {
        Ok(RetrievedContext {
            text: String::new(),
            fragments: 0,
            vector_store_available: false,
        })
    }
}

#[async_trait]
impl NarrativeWriter for MockAgents {
    async fn compose_narrative(
        &self,
        description: &str,
        _goal: &str,
        _retrieved: &str,
    ) -> Result<String, String> {
        Ok(format!("Narrative for: {}", preview(description, 120)))
    }
}

#[async_trait]
impl DomainModeller for MockAgents {
    async fn generate_domain_model(
        &self,
        narrative: &str,
        _retrieved: &str,
    ) -> Result<String, String> {
        Ok(format!(
            "@startuml\n' domain model for: {}\nclass Entity\n@enduml",
            preview(narrative, 60)
        ))
    }

    async fn refine_domain_model(
        &self,
        _narrative: &str,
        plantuml: &str,
        issues: &[Issue],
        _retrieved: &str,
    ) -> Result<String, String> {
        Ok(format!("{}\n' refined: {} issues addressed", plantuml, issues.len()))
    }
}

#[async_trait]
impl Evaluator for MockAgents {
    async fn evaluate_narrative(
        &self,
        _narrative: &str,
        _retrieved: &str,
    ) -> Result<Vec<Issue>, String> {
        Ok(vec![Issue {
            id: "n-1".to_string(),
            title: "Narrative lacks actor detail".to_string(),
            severity: "minor".to_string(),
            suggestion: "Name the primary actors explicitly".to_string(),
        }])
    }

    async fn evaluate_domain_model(
        &self,
        _narrative: &str,
        _retrieved: &str,
        _plantuml: &str,
    ) -> Result<Vec<Issue>, String> {
        Ok(vec![Issue {
            id: "m-1".to_string(),
            title: "Missing aggregate boundary".to_string(),
            severity: "major".to_string(),
            suggestion: "Group entities into aggregates".to_string(),
        }])
    }
}

#[async_trait]
impl UseCaseModeller for MockAgents {
    async fn generate_use_case_model(
        &self,
        _narrative: &str,
        _domain_model: &str,
        _retrieved: &str,
    ) -> Result<String, String> {
        Ok("@startuml\nactor User\nUser --> (Primary use case)\n@enduml".to_string())
    }
}

#[async_trait]
impl MvcModeller for MockAgents {
    async fn generate_mvc_diagram(
        &self,
        _narrative: &str,
        _domain_model: &str,
        _use_case_model: &str,
        _retrieved: &str,
    ) -> Result<String, String> {
        Ok("@startuml\nboundary View\ncontrol Controller\nentity Model\n@enduml".to_string())
    }
}

#[async_trait]
impl ScenarioWriter for MockAgents {
    async fn generate_scenario(
        &self,
        narrative: &str,
        _domain_model: &str,
        _use_case_model: &str,
        _mvc_diagram: &str,
        _retrieved: &str,
    ) -> Result<String, String> {
        Ok(format!(
            "Basic course / alternate courses for: {}",
            preview(narrative, 60)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_outputs_are_deterministic() {
        let mock = MockAgents;
        let a = mock.compose_narrative("desc", "goal", "").await.unwrap();
        let b = mock.compose_narrative("desc", "goal", "").await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("desc"));
    }

    #[tokio::test]
    async fn test_mock_refine_mentions_issue_count() {
        let mock = MockAgents;
        let issues = vec![Issue {
            id: "1".into(),
            title: "t".into(),
            severity: "minor".into(),
            suggestion: "s".into(),
        }];
        let refined = mock
            .refine_domain_model("n", "@startuml\n@enduml", &issues, "")
            .await
            .unwrap();
        assert!(refined.contains("1 issues addressed"));
    }
}
