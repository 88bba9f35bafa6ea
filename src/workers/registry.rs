//! 工作器注册表
//!
//! 所有工作器实现 Worker trait（name / execute），由 WorkerRegistry 按名注册与查找。
//! 暂停是控制流而非错误：execute 以 StepOutcome 显式区分 Done / Paused，
//! Err 分支只承载致命失败。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{Context, WorkflowError};

/// 单步执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// 正常完成，进入下一步
    Done,
    /// 暂停等待人工评审；载荷会持久化并原样返回给调用方
    Paused(Value),
}

/// 工作器 trait：命名的工作单元，在给定参数下变换 Context
///
/// 引擎在执行步骤前先落盘检查点，崩溃恢复会重试同一步，
/// 因此每个工作器都必须可以用同一 Context 安全地重复调用（对自己的 state 键 last-write-wins）。
#[async_trait]
pub trait Worker: Send + Sync {
    /// 工具名（计划中 PlanStep.tool 引用的名字）
    fn name(&self) -> &str;

    /// 执行一步；args 为计划里该步的 JSON 参数对象
    async fn execute(&self, ctx: &mut Context, args: &Value) -> Result<StepOutcome, WorkflowError>;
}

/// 工作器注册表：按名称存储 Arc<dyn Worker>，引擎的唯一多态点
#[derive(Default)]
pub struct WorkerRegistry {
    workers: HashMap<String, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, worker: impl Worker + 'static) {
        let name = worker.name().to_string();
        self.workers.insert(name, Arc::new(worker));
    }

    /// 查找工作器；未注册的名字意味着计划 / 注册表错位，直接报 UnknownTool
    pub fn get(&self, name: &str) -> Result<Arc<dyn Worker>, WorkflowError> {
        self.workers
            .get(name)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownTool(name.to_string()))
    }

    pub fn has_worker(&self, name: &str) -> bool {
        self.workers.contains_key(name)
    }

    pub fn worker_names(&self) -> Vec<String> {
        self.workers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopWorker;

    #[async_trait]
    impl Worker for NoopWorker {
        fn name(&self) -> &str {
            "noop"
        }

        async fn execute(
            &self,
            _ctx: &mut Context,
            _args: &Value,
        ) -> Result<StepOutcome, WorkflowError> {
            Ok(StepOutcome::Done)
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = WorkerRegistry::new();
        registry.register(NoopWorker);
        assert!(registry.has_worker("noop"));
        assert!(registry.get("noop").is_ok());
    }

    #[test]
    fn test_unknown_tool_is_error() {
        let registry = WorkerRegistry::new();
        let err = registry.get("nonexistent-tool").err().expect("expected error");
        assert!(matches!(err, WorkflowError::UnknownTool(name) if name == "nonexistent-tool"));
    }
}
