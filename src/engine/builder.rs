//! 编排器构建器：统一的装配逻辑
//!
//! 从配置出发装配协作方、注册表与会话存储，保证所有接入方式
//! 共享同一套工作器。未显式注入时协作方用 Mock、存储按配置选择。

use std::sync::Arc;
use std::time::Duration;

use crate::agents::AgentServices;
use crate::config::AppConfig;
use crate::engine::orchestrator::Orchestrator;
use crate::session::{create_session_store, SessionStore};
use crate::workers::{
    ModelWorker, MvcWorker, NarrativeWorker, ReviewWorker, ScenarioWorker, UseCaseWorker,
    UserReviewWorker, WorkerRegistry,
};

/// 编排器构建器
pub struct OrchestratorBuilder {
    config: AppConfig,
    agents: Option<AgentServices>,
    store: Option<Arc<dyn SessionStore>>,
}

impl OrchestratorBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            agents: None,
            store: None,
        }
    }

    /// 从 config/default.toml 与环境变量装配
    pub fn from_default_config() -> anyhow::Result<Self> {
        let config = crate::config::load_config(None)?;
        Ok(Self::new(config))
    }

    /// 注入协作方集合（生产环境接真实生成服务，测试用 AgentServices::mock）
    pub fn with_agents(mut self, agents: AgentServices) -> Self {
        self.agents = Some(agents);
        self
    }

    /// 注入会话存储；未注入时按配置走 create_session_store
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 构建统一的工作器注册表（默认计划引用的全部工具名）
    pub fn build_registry(agents: &AgentServices, top_k: usize) -> WorkerRegistry {
        let mut registry = WorkerRegistry::new();
        registry.register(NarrativeWorker::new(
            agents.narrative_writer.clone(),
            agents.retriever.clone(),
            top_k,
        ));
        registry.register(UserReviewWorker);
        registry.register(ModelWorker::new(
            agents.domain_modeller.clone(),
            agents.retriever.clone(),
            top_k,
        ));
        registry.register(ReviewWorker::new(
            agents.evaluator.clone(),
            agents.retriever.clone(),
            top_k,
        ));
        registry.register(UseCaseWorker::new(
            agents.use_case_modeller.clone(),
            agents.retriever.clone(),
            top_k,
        ));
        registry.register(MvcWorker::new(
            agents.mvc_modeller.clone(),
            agents.retriever.clone(),
            top_k,
        ));
        registry.register(ScenarioWorker::new(
            agents.scenario_writer.clone(),
            agents.retriever.clone(),
            top_k,
        ));
        registry
    }

    /// 同步构建；要求已注入存储（异步装配走 build_async）
    pub fn build(self) -> Orchestrator {
        let agents = self.agents.unwrap_or_else(AgentServices::mock);
        let registry = Self::build_registry(&agents, self.config.orchestrator.retrieval_top_k);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(crate::session::MemorySessionStore::new()));
        let step_timeout = self
            .config
            .orchestrator
            .step_timeout_secs
            .map(Duration::from_secs);
        Orchestrator::new(Arc::new(registry), store, step_timeout)
    }

    /// 按配置装配存储（db_path → SQLite，否则内存）后构建
    pub async fn build_async(self) -> Orchestrator {
        let store = match self.store.clone() {
            Some(store) => store,
            None => create_session_store(self.config.store.db_path.as_deref()).await,
        };
        self.with_store(store).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_default_plan() {
        let agents = AgentServices::mock();
        let registry = OrchestratorBuilder::build_registry(&agents, 4);
        let plan = crate::plan::PlanBuilder::new().build("g", false);
        for step in &plan.steps {
            assert!(
                registry.has_worker(&step.tool),
                "missing worker for tool {}",
                step.tool
            );
        }
    }

    #[tokio::test]
    async fn test_build_async_defaults_to_memory_store() {
        let orch = OrchestratorBuilder::new(AppConfig::default())
            .build_async()
            .await;
        let summaries = orch.sessions().await.unwrap();
        assert!(summaries.is_empty());
    }
}
