//! SQLite 会话存储
//!
//! 会话快照落盘到 SQLite，服务重启后可从最近的检查点恢复。
//! CAS：UPDATE 带 version 条件，0 行受影响且主键已存在即视为并发冲突。

#![cfg(feature = "async-sqlite")]

use std::path::Path;

use async_trait::async_trait;
use sqlx::Row;

use crate::core::WorkflowError;
use crate::session::store::SessionStore;
use crate::session::types::{Session, SessionSummary, WorkflowStatus};

/// SQLite 会话存储
pub struct SqliteSessionStore {
    pool: sqlx::sqlite::SqlitePool,
}

fn store_err(e: sqlx::Error) -> WorkflowError {
    WorkflowError::Store(e.to_string())
}

impl SqliteSessionStore {
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let store = Self { pool };
        store.init_tables().await?;
        Ok(store)
    }

    async fn init_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS workflow_sessions (
                run_id TEXT PRIMARY KEY,
                narrative TEXT NOT NULL,
                goal TEXT NOT NULL,
                task TEXT NOT NULL,
                state_json TEXT NOT NULL,
                logs_json TEXT NOT NULL,
                plan_json TEXT NOT NULL,
                current_step_index INTEGER NOT NULL,
                status TEXT NOT NULL,
                review_payload_json TEXT,
                version INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_workflow_sessions_updated ON workflow_sessions(updated_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, WorkflowError> {
        let status_str: String = row.get("status");
        let status = WorkflowStatus::parse(&status_str).ok_or_else(|| {
            WorkflowError::Store(format!("unknown status in store: {}", status_str))
        })?;
        let step_index: i64 = row.get("current_step_index");
        Ok(Session {
            run_id: row.get("run_id"),
            narrative: row.get("narrative"),
            goal: row.get("goal"),
            task: row.get("task"),
            state_json: row.get("state_json"),
            logs_json: row.get("logs_json"),
            plan_json: row.get("plan_json"),
            current_step_index: step_index as usize,
            status,
            review_payload_json: row.get("review_payload_json"),
            version: row.get("version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn save(&self, session: &mut Session) -> Result<(), WorkflowError> {
        let next_version = session.version + 1;

        let updated = sqlx::query(
            "UPDATE workflow_sessions SET
                narrative = ?, goal = ?, task = ?,
                state_json = ?, logs_json = ?, plan_json = ?,
                current_step_index = ?, status = ?, review_payload_json = ?,
                version = ?, updated_at = ?
             WHERE run_id = ? AND version = ?",
        )
        .bind(&session.narrative)
        .bind(&session.goal)
        .bind(&session.task)
        .bind(&session.state_json)
        .bind(&session.logs_json)
        .bind(&session.plan_json)
        .bind(session.current_step_index as i64)
        .bind(session.status.as_str())
        .bind(&session.review_payload_json)
        .bind(next_version)
        .bind(&session.updated_at)
        .bind(&session.run_id)
        .bind(session.version)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if updated.rows_affected() == 0 {
            // 不存在则插入；INSERT OR IGNORE 0 行受影响说明主键已存在但版本不匹配
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO workflow_sessions
                    (run_id, narrative, goal, task, state_json, logs_json, plan_json,
                     current_step_index, status, review_payload_json, version,
                     created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&session.run_id)
            .bind(&session.narrative)
            .bind(&session.goal)
            .bind(&session.task)
            .bind(&session.state_json)
            .bind(&session.logs_json)
            .bind(&session.plan_json)
            .bind(session.current_step_index as i64)
            .bind(session.status.as_str())
            .bind(&session.review_payload_json)
            .bind(next_version)
            .bind(&session.created_at)
            .bind(&session.updated_at)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

            if inserted.rows_affected() == 0 {
                return Err(WorkflowError::ConcurrentModification(session.run_id.clone()));
            }
        }

        session.version = next_version;
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Session, WorkflowError> {
        let row = sqlx::query("SELECT * FROM workflow_sessions WHERE run_id = ?")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?
            .ok_or_else(|| WorkflowError::SessionNotFound(run_id.to_string()))?;
        Self::row_to_session(&row)
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, WorkflowError> {
        let rows = sqlx::query("SELECT * FROM workflow_sessions ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        rows.iter()
            .map(|row| Self::row_to_session(row).map(|s| SessionSummary::from_session(&s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Context;
    use crate::plan::PlanBuilder;
    use tempfile::TempDir;

    fn sample_session(run_id: &str) -> Session {
        let mut ctx = Context::new(run_id, "n", "goal text", "t");
        ctx.log("first");
        ctx.log("second");
        ctx.state
            .insert("plantuml".to_string(), serde_json::json!("@startuml\n@enduml"));
        let plan = PlanBuilder::new().build("goal text", false);
        let mut session = Session::new_shell(run_id, None);
        session
            .capture(&ctx, &plan, 2, WorkflowStatus::SuspendedForReview, Some("{}".to_string()))
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_session_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sessions.db");

        let store = SqliteSessionStore::new(&db_path).await.unwrap();
        let mut session = sample_session("r1");
        store.save(&mut session).await.unwrap();
        store.close().await;

        let store2 = SqliteSessionStore::new(&db_path).await.unwrap();
        let loaded = store2.load("r1").await.unwrap();
        assert_eq!(loaded, session);

        let ctx = loaded.restore_context().unwrap();
        assert_eq!(ctx.logs, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(loaded.restore_plan().unwrap().steps.len(), 8);
    }

    #[tokio::test]
    async fn test_cas_conflict_on_stale_version() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sessions.db");
        let store = SqliteSessionStore::new(&db_path).await.unwrap();

        let mut session = sample_session("r1");
        store.save(&mut session).await.unwrap();

        let mut stale = session.clone();
        stale.version = 0;
        let err = store.save(&mut stale).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ConcurrentModification(_)));
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sessions.db");
        let store = SqliteSessionStore::new(&db_path).await.unwrap();

        let mut a = sample_session("a");
        a.updated_at = "2026-01-01T00:00:00Z".to_string();
        store.save(&mut a).await.unwrap();
        let mut b = sample_session("b");
        b.updated_at = "2026-02-01T00:00:00Z".to_string();
        store.save(&mut b).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries[0].run_id, "b");
    }
}
