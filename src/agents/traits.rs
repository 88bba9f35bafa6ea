//! 协作方 trait 定义
//!
//! 所有后端（生成式服务 / Mock）实现这些 trait；与工具执行器一样，
//! 协作方一侧统一用 `Result<_, String>` 报错，由工作器转成 WorkflowError。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 评审意见：review 工作器产出、model(refine) 消费
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub severity: String,
    pub suggestion: String,
}

/// 一次检索的结果：拼好的上下文文本与命中统计
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    pub text: String,
    pub fragments: usize,
    pub vector_store_available: bool,
}

/// 检索协作方：按查询取 top_k 个上下文片段
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<RetrievedContext, String>;
}

/// 叙事写作
#[async_trait]
pub trait NarrativeWriter: Send + Sync {
    async fn compose_narrative(
        &self,
        description: &str,
        goal: &str,
        retrieved: &str,
    ) -> Result<String, String>;
}

/// 领域建模：生成与按评审意见修订（PlantUML 文本）
#[async_trait]
pub trait DomainModeller: Send + Sync {
    async fn generate_domain_model(
        &self,
        narrative: &str,
        retrieved: &str,
    ) -> Result<String, String>;

    async fn refine_domain_model(
        &self,
        narrative: &str,
        plantuml: &str,
        issues: &[Issue],
        retrieved: &str,
    ) -> Result<String, String>;
}

/// 评审：对叙事或领域模型产出意见列表
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate_narrative(
        &self,
        narrative: &str,
        retrieved: &str,
    ) -> Result<Vec<Issue>, String>;

    async fn evaluate_domain_model(
        &self,
        narrative: &str,
        retrieved: &str,
        plantuml: &str,
    ) -> Result<Vec<Issue>, String>;
}

/// 用例建模（PlantUML 用例图）
#[async_trait]
pub trait UseCaseModeller: Send + Sync {
    async fn generate_use_case_model(
        &self,
        narrative: &str,
        domain_model: &str,
        retrieved: &str,
    ) -> Result<String, String>;
}

/// 健壮性 / MVC 建模（PlantUML）
#[async_trait]
pub trait MvcModeller: Send + Sync {
    async fn generate_mvc_diagram(
        &self,
        narrative: &str,
        domain_model: &str,
        use_case_model: &str,
        retrieved: &str,
    ) -> Result<String, String>;
}

/// 场景写作
#[async_trait]
pub trait ScenarioWriter: Send + Sync {
    async fn generate_scenario(
        &self,
        narrative: &str,
        domain_model: &str,
        use_case_model: &str,
        mvc_diagram: &str,
        retrieved: &str,
    ) -> Result<String, String>;
}
