//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `ICONIX__*` 覆盖（双下划线表示嵌套，如 `ICONIX__STORE__DB_PATH=data/iconix.db`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
}

/// [app] 段：应用名
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [store] 段：会话存储；db_path 未设置时使用内存存储
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreSection {
    /// SQLite 数据库文件路径（需启用 async-sqlite feature）
    pub db_path: Option<PathBuf>,
}

/// [orchestrator] 段：单步超时与检索条数
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSection {
    /// 单个工作器执行超时（秒）；未设置时不限时
    pub step_timeout_secs: Option<u64>,
    /// 每步检索的上下文片段数
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            step_timeout_secs: None,
            retrieval_top_k: default_retrieval_top_k(),
        }
    }
}

fn default_retrieval_top_k() -> usize {
    4
}

/// 从 config 目录加载配置，环境变量 ICONIX__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 ICONIX__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ICONIX")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert!(cfg.store.db_path.is_none());
        assert!(cfg.orchestrator.step_timeout_secs.is_none());
        assert_eq!(cfg.orchestrator.retrieval_top_k, 4);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [orchestrator]
            step_timeout_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(cfg.orchestrator.step_timeout_secs, Some(120));
        assert_eq!(cfg.orchestrator.retrieval_top_k, 4);
    }
}
