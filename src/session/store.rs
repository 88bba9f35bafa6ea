//! 会话存储抽象层
//!
//! 定义统一的会话持久化接口，支持内存和 SQLite 两种实现。
//! save 以 run_id 为键 upsert，并对 version 做 compare-and-swap：
//! 版本落后说明有并发写入者，返回 ConcurrentModification。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::WorkflowError;
use crate::session::types::{Session, SessionSummary};

/// 会话存储接口
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// upsert；要求 session.version 与存量一致，成功后原地 +1
    async fn save(&self, session: &mut Session) -> Result<(), WorkflowError>;

    /// 按 run_id 读取；不存在返回 SessionNotFound
    async fn load(&self, run_id: &str) -> Result<Session, WorkflowError>;

    /// 全部会话的轻量投影，按更新时间倒序（新的在前）
    async fn list(&self) -> Result<Vec<SessionSummary>, WorkflowError>;
}

/// 内存会话存储（测试与嵌入式场景；不跨进程存活）
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &mut Session) -> Result<(), WorkflowError> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session.run_id) {
            if existing.version != session.version {
                return Err(WorkflowError::ConcurrentModification(session.run_id.clone()));
            }
        }
        session.version += 1;
        sessions.insert(session.run_id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Session, WorkflowError> {
        self.sessions
            .read()
            .await
            .get(run_id)
            .cloned()
            .ok_or_else(|| WorkflowError::SessionNotFound(run_id.to_string()))
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, WorkflowError> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> =
            sessions.values().map(SessionSummary::from_session).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

/// 创建会话存储
///
/// 提供了 db_path 且启用 async-sqlite feature 时用 SQLite，否则退回内存存储
pub async fn create_session_store(
    db_path: Option<&std::path::Path>,
) -> Arc<dyn SessionStore> {
    #[cfg(feature = "async-sqlite")]
    if let Some(path) = db_path {
        match crate::session::sqlite::SqliteSessionStore::new(path).await {
            Ok(store) => {
                tracing::info!("Using SQLite session store: {:?}", path);
                return Arc::new(store);
            }
            Err(e) => {
                tracing::warn!("Failed to open SQLite store, falling back to memory: {}", e);
            }
        }
    }

    #[cfg(not(feature = "async-sqlite"))]
    if db_path.is_some() {
        tracing::warn!("SQLite session store requested but async-sqlite feature not enabled, using memory store");
    }

    tracing::info!("Using in-memory session store");
    Arc::new(MemorySessionStore::new())
}
