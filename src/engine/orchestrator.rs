//! 编排器：计划执行主循环
//!
//! 单线程同步语义：一次 run / resume 在调用方任务上执行完可执行的步骤区间后返回。
//! 暂停不是协作式调度：控制权完全交还调用方，之后用新的 resume 调用从
//! SessionStore 重建状态再入。每步执行前先落盘 Running 检查点，
//! 崩溃恢复会重试同一步（工作器必须可安全重复调用）。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::core::{Context, WorkflowError, KEY_PLANTUML};
use crate::engine::types::{
    build_core_artifacts, ResumeRequest, WorkflowRequest, WorkflowResponse, ARTIFACT_REVIEW_DATA,
    ARTIFACT_STATUS,
};
use crate::plan::{Plan, PlanBuilder};
use crate::session::{Session, SessionStore, SessionSummary, WorkflowStatus};
use crate::workers::{StepOutcome, Worker, WorkerRegistry};

/// 工作流编排器
///
/// 同一 run_id 上的 run / resume 由进程内互斥锁串行化；
/// 不同 run_id 完全独立。会话不做进程内缓存，每次调用都从存储重读。
pub struct Orchestrator {
    registry: Arc<WorkerRegistry>,
    store: Arc<dyn SessionStore>,
    plan_builder: PlanBuilder,
    step_timeout: Option<Duration>,
    run_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        store: Arc<dyn SessionStore>,
        step_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            store,
            plan_builder: PlanBuilder::new(),
            step_timeout,
            run_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 启动（或幂等再入）一次 workflow
    ///
    /// - 已有 SUSPENDED_FOR_REVIEW 会话：等价于不带覆盖的 resume
    /// - 已有 RUNNING 会话：崩溃恢复，从落盘的步骤下标重试
    /// - 其余情况：新建 Context 与 Plan，从第 0 步执行
    pub async fn run(
        &self,
        req: WorkflowRequest,
        cancel: CancellationToken,
    ) -> Result<WorkflowResponse, WorkflowError> {
        let run_id = req
            .run_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let lock = self.lock_for(&run_id).await;
        let _guard = lock.lock().await;

        let existing = self.load_optional(&run_id).await?;
        if let Some(session) = existing.as_ref() {
            match session.status {
                WorkflowStatus::SuspendedForReview => {
                    tracing::info!(run_id = %run_id, "run on suspended session, delegating to resume");
                    return self
                        .resume_locked(session.clone(), ResumeRequest::default(), cancel)
                        .await;
                }
                WorkflowStatus::Running => {
                    tracing::info!(
                        run_id = %run_id,
                        step = session.current_step_index,
                        "run on running session, recovering from last checkpoint"
                    );
                    let ctx = session.restore_context()?;
                    let plan = session.restore_plan()?;
                    let start = session.current_step_index;
                    return self
                        .execute_from(session.clone(), ctx, plan, start, cancel)
                        .await;
                }
                _ => {}
            }
        }

        let goal = req.goal.unwrap_or_default().trim().to_string();
        tracing::info!(run_id = %run_id, goal_chars = goal.len(), "starting workflow");

        let mut ctx = Context::new(
            &run_id,
            req.narrative.unwrap_or_default(),
            goal,
            req.task.unwrap_or_default(),
        );
        if let Some(dm) = req
            .domain_model_override
            .filter(|dm| !dm.trim().is_empty())
        {
            ctx.state.insert(KEY_PLANTUML.to_string(), Value::String(dm));
        }

        let plan = self.plan_builder.build(&ctx.goal, req.review_only);
        ctx.log(format!("plan: {}", plan.rationale));

        let session = Session::new_shell(&run_id, existing.as_ref());
        self.execute_from(session, ctx, plan, 0, cancel).await
    }

    /// 从暂停点恢复；仅 SUSPENDED_FOR_REVIEW 的会话可恢复
    pub async fn resume(
        &self,
        run_id: &str,
        req: ResumeRequest,
        cancel: CancellationToken,
    ) -> Result<WorkflowResponse, WorkflowError> {
        let lock = self.lock_for(run_id).await;
        let _guard = lock.lock().await;

        let session = self.store.load(run_id).await?;
        if session.status != WorkflowStatus::SuspendedForReview {
            return Err(WorkflowError::InvalidResumeState {
                run_id: run_id.to_string(),
                status: session.status.to_string(),
            });
        }
        tracing::info!(run_id = %run_id, step = session.current_step_index, "resuming workflow");
        self.resume_locked(session, req, cancel).await
    }

    /// 读取已存会话并投影成响应（不执行任何步骤）
    pub async fn session_response(&self, run_id: &str) -> Result<WorkflowResponse, WorkflowError> {
        let session = self.store.load(run_id).await?;
        let ctx = session.restore_context()?;
        let plan = session.restore_plan()?;

        let mut artifacts = build_core_artifacts(&ctx.goal, ctx.effective_narrative(), &ctx.state);
        artifacts.insert(
            ARTIFACT_STATUS.to_string(),
            Value::String(session.status.to_string()),
        );
        if let Some(payload) = session.review_payload() {
            artifacts.insert(ARTIFACT_REVIEW_DATA.to_string(), payload);
        }

        Ok(WorkflowResponse {
            run_id: session.run_id,
            plan,
            artifacts,
            logs: ctx.logs,
        })
    }

    /// 全部会话的轻量列表（新的在前）
    pub async fn sessions(&self) -> Result<Vec<SessionSummary>, WorkflowError> {
        self.store.list().await
    }

    /// 持锁状态下的恢复：合并用户覆盖后从 current_step_index + 1 再入主循环。
    /// 引发暂停的那一步不会被重复执行。
    async fn resume_locked(
        &self,
        session: Session,
        req: ResumeRequest,
        cancel: CancellationToken,
    ) -> Result<WorkflowResponse, WorkflowError> {
        let mut ctx = session.restore_context()?;
        let plan = session.restore_plan()?;

        if let Some(narrative) = req.narrative.as_deref() {
            ctx.override_narrative(narrative);
        }
        if let Some(dm) = req.domain_model.filter(|dm| !dm.trim().is_empty()) {
            ctx.state.insert(KEY_PLANTUML.to_string(), Value::String(dm));
            ctx.log("resume: domain model overridden by user".to_string());
        }

        let start = session.current_step_index + 1;
        self.execute_from(session, ctx, plan, start, cancel).await
    }

    /// run 与 resume 共用的主循环
    async fn execute_from(
        &self,
        mut session: Session,
        mut ctx: Context,
        plan: Plan,
        start_index: usize,
        cancel: CancellationToken,
    ) -> Result<WorkflowResponse, WorkflowError> {
        let total = plan.steps.len();

        for i in start_index..total {
            // 执行前先落盘：崩溃后从这一步重试
            self.checkpoint(&mut session, &ctx, &plan, i, WorkflowStatus::Running, None)
                .await?;

            let step = &plan.steps[i];
            tracing::info!(step = i + 1, total, tool = %step.tool, "executing step");

            let worker = match self.registry.get(&step.tool) {
                Ok(worker) => worker,
                Err(e) => {
                    self.checkpoint(&mut session, &ctx, &plan, i, WorkflowStatus::Failed, None)
                        .await?;
                    return Err(e);
                }
            };

            let started = Instant::now();
            let result = self
                .dispatch(worker.as_ref(), &mut ctx, &step.args, &cancel)
                .await;
            self.audit(&step.tool, i, started.elapsed(), &result);

            match result {
                Ok(StepOutcome::Done) => {}
                Ok(StepOutcome::Paused(payload)) => {
                    let payload_json = serde_json::to_string(&payload)?;
                    self.checkpoint(
                        &mut session,
                        &ctx,
                        &plan,
                        i,
                        WorkflowStatus::SuspendedForReview,
                        Some(payload_json),
                    )
                    .await?;
                    tracing::info!(step = i + 1, "workflow suspended for user review");

                    let mut artifacts =
                        build_core_artifacts(&ctx.goal, ctx.effective_narrative(), &ctx.state);
                    artifacts.insert(
                        ARTIFACT_STATUS.to_string(),
                        Value::String(WorkflowStatus::SuspendedForReview.to_string()),
                    );
                    artifacts.insert(ARTIFACT_REVIEW_DATA.to_string(), payload);
                    return Ok(WorkflowResponse {
                        run_id: ctx.run_id.clone(),
                        plan,
                        artifacts,
                        logs: ctx.logs,
                    });
                }
                Err(WorkflowError::Cancelled) => {
                    // 不写新检查点：会话停留在本步执行前的 Running 快照，可安全重试
                    tracing::warn!(step = i + 1, "workflow cancelled");
                    return Err(WorkflowError::Cancelled);
                }
                Err(e) => {
                    tracing::error!(step = i + 1, error = %e, "step failed");
                    self.checkpoint(&mut session, &ctx, &plan, i, WorkflowStatus::Failed, None)
                        .await?;
                    return Err(e);
                }
            }
        }

        self.checkpoint(
            &mut session,
            &ctx,
            &plan,
            total.saturating_sub(1),
            WorkflowStatus::Completed,
            None,
        )
        .await?;
        tracing::info!(run_id = %ctx.run_id, "workflow completed");

        let mut artifacts = build_core_artifacts(&ctx.goal, ctx.effective_narrative(), &ctx.state);
        artifacts.insert(
            ARTIFACT_STATUS.to_string(),
            Value::String(WorkflowStatus::Completed.to_string()),
        );
        Ok(WorkflowResponse {
            run_id: ctx.run_id.clone(),
            plan,
            artifacts,
            logs: ctx.logs,
        })
    }

    /// 单步分发：可选超时 + 取消
    async fn dispatch(
        &self,
        worker: &dyn Worker,
        ctx: &mut Context,
        args: &Value,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, WorkflowError> {
        if cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }
        let name = worker.name().to_string();
        let fut = worker.execute(ctx, args);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WorkflowError::Cancelled),
            result = async {
                match self.step_timeout {
                    Some(limit) => timeout(limit, fut)
                        .await
                        .map_err(|_| WorkflowError::StepTimeout(name))?,
                    None => fut.await,
                }
            } => result,
        }
    }

    /// 结构化审计日志（JSON 单行）
    fn audit(
        &self,
        tool: &str,
        index: usize,
        elapsed: Duration,
        result: &Result<StepOutcome, WorkflowError>,
    ) {
        let (ok, outcome) = match result {
            Ok(StepOutcome::Done) => (true, "done"),
            Ok(StepOutcome::Paused(_)) => (true, "paused"),
            Err(WorkflowError::Cancelled) => (false, "cancelled"),
            Err(WorkflowError::StepTimeout(_)) => (false, "timeout"),
            Err(_) => (false, "error"),
        };
        let audit = serde_json::json!({
            "event": "step_audit",
            "tool": tool,
            "step": index,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": elapsed.as_millis() as u64,
        });
        tracing::info!(audit = %audit.to_string(), "step");
    }

    async fn checkpoint(
        &self,
        session: &mut Session,
        ctx: &Context,
        plan: &Plan,
        index: usize,
        status: WorkflowStatus,
        review_payload_json: Option<String>,
    ) -> Result<(), WorkflowError> {
        session.capture(ctx, plan, index, status, review_payload_json)?;
        self.store.save(session).await
    }

    async fn load_optional(&self, run_id: &str) -> Result<Option<Session>, WorkflowError> {
        match self.store.load(run_id).await {
            Ok(session) => Ok(Some(session)),
            Err(WorkflowError::SessionNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn lock_for(&self, run_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.run_locks.lock().await;
        locks
            .entry(run_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
