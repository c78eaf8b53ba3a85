//! 引擎上下文
//!
//! 跨规则、跨执行共享的状态。少量约定键提供类型化访问，其余键作为开放的键值层保存。

use serde_json::Value;
use std::collections::HashMap;

/// 约定的上下文键
pub mod keys {
    /// 置为 `true` 时，读取该键的条件可以无视参数直接放行
    pub const FORCE_PASS: &str = "ForcePass";
    /// 置为 `true` 表示调用方希望中止；引擎本身不检查，由条件/动作自行决定是否短路
    pub const CANCELLED: &str = "Cancelled";
}

/// 引擎上下文
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    values: HashMap<String, Value>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置，用于构造初始上下文
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// 设置键值，同名键的旧值被遮蔽
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 非布尔值一律视为 false
    fn flag(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn force_pass(&self) -> bool {
        self.flag(keys::FORCE_PASS)
    }

    pub fn set_force_pass(&mut self, enabled: bool) {
        self.set(keys::FORCE_PASS, enabled);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag(keys::CANCELLED)
    }

    pub fn cancel(&mut self) {
        self.set(keys::CANCELLED, true);
    }
}
