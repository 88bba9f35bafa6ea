//! 生成协作方抽象
//!
//! 工件的实际生成（提示词构造、对生成式服务的调用、检索）都在引擎之外；
//! 这里只定义各协作方的 trait 与测试 / 离线可用的 Mock 实现。

pub mod mock;
pub mod traits;

use std::sync::Arc;

pub use mock::MockAgents;
pub use traits::{
    ContextRetriever, DomainModeller, Evaluator, Issue, MvcModeller, NarrativeWriter,
    RetrievedContext, ScenarioWriter, UseCaseModeller,
};

/// 工作器依赖的协作方集合，便于统一注入
#[derive(Clone)]
pub struct AgentServices {
    pub retriever: Arc<dyn ContextRetriever>,
    pub narrative_writer: Arc<dyn NarrativeWriter>,
    pub domain_modeller: Arc<dyn DomainModeller>,
    pub evaluator: Arc<dyn Evaluator>,
    pub use_case_modeller: Arc<dyn UseCaseModeller>,
    pub mvc_modeller: Arc<dyn MvcModeller>,
    pub scenario_writer: Arc<dyn ScenarioWriter>,
}

impl AgentServices {
    /// 全 Mock 的协作方集合（测试与本地跑通用）
    pub fn mock() -> Self {
        let mock = Arc::new(MockAgents::default());
        Self {
            retriever: mock.clone() as Arc<dyn ContextRetriever>,
            narrative_writer: mock.clone() as Arc<dyn NarrativeWriter>,
            domain_modeller: mock.clone() as Arc<dyn DomainModeller>,
            evaluator: mock.clone() as Arc<dyn Evaluator>,
            use_case_modeller: mock.clone() as Arc<dyn UseCaseModeller>,
            mvc_modeller: mock.clone() as Arc<dyn MvcModeller>,
            scenario_writer: mock as Arc<dyn ScenarioWriter>,
        }
    }
}
