//! 规则
//!
//! 一条规则由一个条件、一个动作和一个优先级组成，执行时先评估条件再运行动作。

use crate::arguments::Arguments;
use crate::condition::{Action, Condition};
use crate::context::EngineContext;
use crate::error::{Result, RuleError};
use std::fmt;

/// 直接持有条件和动作实现的规则
#[derive(Debug, Clone)]
pub struct Rule {
    pub condition: Condition,
    pub action: Action,
    /// 数值越小越先执行
    pub priority: i32,
}

impl Rule {
    pub fn new(condition: Condition, action: Action, priority: i32) -> Self {
        Self {
            condition,
            action,
            priority,
        }
    }

    /// 评估条件并执行动作
    ///
    /// 依次检查：条件缺失、条件不满足、动作缺失，最后运行动作并透传其错误。
    pub fn apply(&self, ctx: &EngineContext, args: &Arguments) -> Result<()> {
        if !self.condition.is_bound() {
            return Err(RuleError::MissingCondition);
        }

        if !self.condition.evaluate(ctx, args) {
            return Err(RuleError::ConditionNotMet(self.condition.name().to_string()));
        }

        self.action.run(ctx, args)
    }

    /// 只运行动作，不评估条件
    pub fn run_action(&self, ctx: &EngineContext, args: &Arguments) -> Result<()> {
        self.action.run(ctx, args)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} (priority {})",
            self.condition.name(),
            self.action.name(),
            self.priority
        )
    }
}
