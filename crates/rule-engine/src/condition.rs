//! 条件与动作
//!
//! 条件是带名字的谓词，动作是带名字、可能失败的副作用。两者都接收引擎上下文和参数包。

use crate::arguments::Arguments;
use crate::context::EngineContext;
use crate::error::{Result, RuleError};
use std::fmt;
use std::sync::Arc;

pub type ConditionFn = Arc<dyn Fn(&EngineContext, &Arguments) -> bool + Send + Sync>;

pub type ActionFn = Arc<dyn Fn(&EngineContext, &Arguments) -> anyhow::Result<()> + Send + Sync>;

/// 条件
///
/// 无法判定真假的条件应返回 `false`，而不是报错。
#[derive(Clone)]
pub struct Condition {
    name: String,
    func: Option<ConditionFn>,
}

impl Condition {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&EngineContext, &Arguments) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Some(Arc::new(func)),
        }
    }

    /// 只有名字、没有实现的条件；规则执行时会报 `MissingCondition`
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            func: None,
        }
    }

    pub fn from_fn(name: impl Into<String>, func: ConditionFn) -> Self {
        Self {
            name: name.into(),
            func: Some(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.func.is_some()
    }

    /// 评估条件，未绑定实现时返回 false
    pub fn evaluate(&self, ctx: &EngineContext, args: &Arguments) -> bool {
        match &self.func {
            Some(func) => func(ctx, args),
            None => false,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// 动作
#[derive(Clone)]
pub struct Action {
    name: String,
    func: Option<ActionFn>,
}

impl Action {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&EngineContext, &Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Some(Arc::new(func)),
        }
    }

    /// 只有名字、没有实现的动作；规则执行时会报 `MissingAction`
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            func: None,
        }
    }

    pub fn from_fn(name: impl Into<String>, func: ActionFn) -> Self {
        Self {
            name: name.into(),
            func: Some(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.func.is_some()
    }

    /// 执行动作
    ///
    /// 动作返回的错误原样放进 `ActionFailed::source`。
    pub fn run(&self, ctx: &EngineContext, args: &Arguments) -> Result<()> {
        let func = self.func.as_ref().ok_or(RuleError::MissingAction)?;

        func(ctx, args).map_err(|source| RuleError::ActionFailed {
            action: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}
