//! 会话持久化层：类型、存储抽象与实现

pub mod sqlite;
pub mod store;
pub mod types;

pub use store::{create_session_store, MemorySessionStore, SessionStore};
pub use types::{Session, SessionSummary, WorkflowStatus};

#[cfg(feature = "async-sqlite")]
pub use sqlite::SqliteSessionStore;
