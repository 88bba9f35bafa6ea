//! 运行上下文
//!
//! 单次 run 的可变状态袋：不可变输入（narrative / goal / task）、开放的 state 映射
//! 与只追加的 logs。state / logs 归当次 run 独占，不跨 run 共享。

use serde_json::Value;

/// 内置工作器约定的 state 键集合（对可插拔工作器保持开放，内置集只读写以下键）
pub const KEY_PLANTUML: &str = "plantuml";
pub const KEY_ISSUES: &str = "issues";
pub const KEY_ISSUES_RAW: &str = "issuesRaw";
pub const KEY_NARRATIVE_ISSUES: &str = "narrativeIssues";
pub const KEY_USE_CASE_MODEL: &str = "useCaseModel";
pub const KEY_MVC_DIAGRAM: &str = "mvcDiagram";
pub const KEY_SCENARIO: &str = "scenario";

/// 流水线共享上下文
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub run_id: String,
    pub narrative: String,
    pub goal: String,
    pub task: String,
    /// narrative 工作器或用户恢复输入写入的覆盖文本；非空时对下游生效
    narrative_override: Option<String>,
    /// 工件袋：plantuml、useCaseModel、mvcDiagram、scenario、issues 等
    pub state: serde_json::Map<String, Value>,
    /// 只追加的执行轨迹，仅用于观测
    pub logs: Vec<String>,
}

impl Context {
    pub fn new(
        run_id: impl Into<String>,
        narrative: impl Into<String>,
        goal: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            narrative: narrative.into(),
            goal: goal.into(),
            task: task.into(),
            narrative_override: None,
            state: serde_json::Map::new(),
            logs: Vec::new(),
        }
    }

    /// 追加一行执行轨迹；只有副作用，永不失败
    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// 设置叙事覆盖；空白文本为 no-op，保留原值
    pub fn override_narrative(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.narrative_override = Some(text.to_string());
        }
    }

    /// 生效叙事：覆盖值非空时返回覆盖值，否则返回原始 narrative
    pub fn effective_narrative(&self) -> &str {
        match &self.narrative_override {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.narrative,
        }
    }

    /// 读取 state 中的字符串值
    pub fn state_str(&self, key: &str) -> Option<&str> {
        self.state.get(key).and_then(Value::as_str)
    }
}
