//! 注册表
//!
//! 按名字登记条件、动作和子引擎，让纯数据的规则定义在执行时绑定到可执行实现。
//! 同名重复登记以最后一次为准，不报错。注册表本身不加锁，跨线程共享需由调用方同步。

use crate::arguments::Arguments;
use crate::condition::{Action, Condition};
use crate::context::EngineContext;
use crate::engine::RuleEngine;
use std::collections::HashMap;
use tracing::debug;

/// 条件、动作与子引擎的名字表
#[derive(Debug, Clone, Default)]
pub struct Registry {
    conditions: HashMap<String, Condition>,
    actions: HashMap<String, Action>,
    engines: HashMap<String, RuleEngine>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记条件实现
    pub fn add_condition<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&EngineContext, &Arguments) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let condition = Condition::new(name.clone(), func);
        self.insert_condition(name, condition);
    }

    /// 以指定名字登记已有的条件（例如组合条件）
    pub fn insert_condition(&mut self, name: impl Into<String>, condition: Condition) {
        let name = name.into();
        if self.conditions.insert(name.clone(), condition).is_some() {
            debug!("条件被覆盖: {}", name);
        }
    }

    pub fn get_condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    pub fn contains_condition(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    /// 登记动作实现
    pub fn add_action<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&EngineContext, &Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let action = Action::new(name.clone(), func);
        self.insert_action(name, action);
    }

    pub fn insert_action(&mut self, name: impl Into<String>, action: Action) {
        let name = name.into();
        if self.actions.insert(name.clone(), action).is_some() {
            debug!("动作被覆盖: {}", name);
        }
    }

    pub fn get_action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn contains_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// 登记子引擎
    ///
    /// 仅用于按名字查找，父引擎执行时不会连带执行子引擎。
    pub fn add_engine(&mut self, name: impl Into<String>, engine: RuleEngine) {
        let name = name.into();
        if self.engines.insert(name.clone(), engine).is_some() {
            debug!("引擎被覆盖: {}", name);
        }
    }

    pub fn get_engine(&self, name: &str) -> Option<&RuleEngine> {
        self.engines.get(name)
    }

    /// 获取子引擎的可变引用，用于追加规则或直接执行
    pub fn get_engine_mut(&mut self, name: &str) -> Option<&mut RuleEngine> {
        self.engines.get_mut(name)
    }

    /// 已登记的条件名（已排序）
    pub fn condition_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.conditions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 已登记的动作名（已排序）
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn engine_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
