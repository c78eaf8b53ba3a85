//! 规则定义
//!
//! 纯数据形式的规则：只记录条件名、动作名、优先级和绑定参数，执行时再到注册表中解析实现。
//! 规则定义可以从 JSON 加载，与可执行代码分开维护。

use crate::arguments::Arguments;
use crate::context::EngineContext;
use crate::error::{Result, RuleError};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 按名字引用条件和动作的规则
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// 展示用名称，可省略
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub priority: i32,
    /// 绑定参数，作为默认值；执行时传入的同名参数优先
    #[serde(default)]
    pub arguments: Arguments,
}

impl RuleDefinition {
    pub fn new(condition: impl Into<String>, action: impl Into<String>, priority: i32) -> Self {
        Self {
            condition: condition.into(),
            action: action.into(),
            priority,
            ..Default::default()
        }
    }

    /// 以条件开头构造规则定义，动作稍后通过 [`then`](Self::then) 或直接赋值绑定
    pub fn when(condition: impl Into<String>, arguments: Arguments, priority: i32) -> Self {
        Self {
            condition: condition.into(),
            arguments,
            priority,
            ..Default::default()
        }
    }

    pub fn then(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_list(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }

    /// 绑定参数与调用参数合并后的结果
    pub fn effective_arguments(&self, args: &Arguments) -> Arguments {
        self.arguments.merged_with(args)
    }

    /// 在注册表中解析条件和动作后执行
    ///
    /// 失败顺序与 [`Rule::apply`](crate::Rule::apply) 一致，额外区分名字未注册的情况。
    pub fn apply(&self, registry: &Registry, ctx: &EngineContext, args: &Arguments) -> Result<()> {
        if self.condition.is_empty() {
            return Err(RuleError::MissingCondition);
        }

        let condition = registry
            .get_condition(&self.condition)
            .ok_or_else(|| RuleError::ConditionNotFound(self.condition.clone()))?;

        let args = self.effective_arguments(args);

        if !condition.evaluate(ctx, &args) {
            return Err(RuleError::ConditionNotMet(self.condition.clone()));
        }

        self.invoke_action(registry, ctx, &args)
    }

    /// 只解析并运行动作，不评估条件
    pub fn run_action(
        &self,
        registry: &Registry,
        ctx: &EngineContext,
        args: &Arguments,
    ) -> Result<()> {
        self.invoke_action(registry, ctx, &self.effective_arguments(args))
    }

    fn invoke_action(
        &self,
        registry: &Registry,
        ctx: &EngineContext,
        args: &Arguments,
    ) -> Result<()> {
        if self.action.is_empty() {
            return Err(RuleError::MissingAction);
        }

        let action = registry
            .get_action(&self.action)
            .ok_or_else(|| RuleError::ActionNotFound(self.action.clone()))?;

        action.run(ctx, args)
    }
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}: ", name)?;
        }
        write!(
            f,
            "{} -> {} (priority {})",
            self.condition, self.action, self.priority
        )
    }
}
