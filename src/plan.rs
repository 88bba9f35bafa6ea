//! 计划构建
//!
//! PlanBuilder 是纯函数、无 I/O：相同输入永远得到结构相同的 Plan。
//! 默认 8 步：narrative → userReview → model(generate) → review(model) →
//! model(refine) → usecase → mvc → scenario。userReview 紧跟 narrative，
//! 保证昂贵的模型合成不会在未经确认的叙事上进行。

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 计划中的单步：工具名 + 参数；构造后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub tool: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    json!({})
}

impl PlanStep {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }
}

/// 一次 run 对应一个 Plan；构建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub rationale: String,
    pub steps: Vec<PlanStep>,
}

/// 确定性计划构建器
///
/// 原实现曾按 goal 文本子串猜测「只评审叙事」的意图，两个编排器副本行为还不一致。
/// 这里不做任何文本匹配：调用方通过请求上的 review_only 显式选择短计划。
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanBuilder;

impl PlanBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建计划；_goal 仅保留在签名中以示计划与目标同源，不参与任何分支
    pub fn build(&self, _goal: &str, review_only: bool) -> Plan {
        if review_only {
            return Plan {
                rationale: "Narrative → Review(narrative) → UserReview. 只生成并评审叙事，不做模型合成。"
                    .to_string(),
                steps: vec![
                    PlanStep::new("narrative", json!({})),
                    PlanStep::new("review", json!({"target": "narrative"})),
                    PlanStep::new("userReview", json!({})),
                ],
            };
        }

        Plan {
            rationale: "Narrative → UserReview → Model → Review → Model(refine) → UseCase → MVC → Scenario. 叙事先经用户确认，再构建模型。"
                .to_string(),
            steps: vec![
                PlanStep::new("narrative", json!({})),
                PlanStep::new("userReview", json!({})),
                PlanStep::new("model", json!({"mode": "generate"})),
                PlanStep::new("review", json!({"target": "model"})),
                PlanStep::new("model", json!({"mode": "refine"})),
                PlanStep::new("usecase", json!({})),
                PlanStep::new("mvc", json!({})),
                PlanStep::new("scenario", json!({})),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_deterministic() {
        let builder = PlanBuilder::new();
        let a = builder.build("build an online shop", false);
        let b = builder.build("build an online shop", false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_plan_shape() {
        let plan = PlanBuilder::new().build("anything", false);
        let tools: Vec<&str> = plan.steps.iter().map(|s| s.tool.as_str()).collect();
        assert_eq!(
            tools,
            vec![
                "narrative",
                "userReview",
                "model",
                "review",
                "model",
                "usecase",
                "mvc",
                "scenario"
            ]
        );
        assert_eq!(plan.steps[2].args["mode"], "generate");
        assert_eq!(plan.steps[3].args["target"], "model");
        assert_eq!(plan.steps[4].args["mode"], "refine");
    }

    #[test]
    fn test_goal_text_never_changes_plan() {
        let builder = PlanBuilder::new();
        // 原实现会对这类措辞做子串匹配；这里目标文本不参与分支
        let a = builder.build("please review only the narrative", false);
        let b = builder.build("whatever else", false);
        assert_eq!(a.steps, b.steps);
    }

    #[test]
    fn test_review_only_plan_shape() {
        let plan = PlanBuilder::new().build("g", true);
        let tools: Vec<&str> = plan.steps.iter().map(|s| s.tool.as_str()).collect();
        assert_eq!(tools, vec!["narrative", "review", "userReview"]);
        assert_eq!(plan.steps[1].args["target"], "narrative");
    }

    #[test]
    fn test_plan_json_round_trip() {
        let plan = PlanBuilder::new().build("g", false);
        let json = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}
