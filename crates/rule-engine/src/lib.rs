//! 规则引擎
//!
//! 提供可复用的规则评估能力，支持：
//! - 命名条件与动作，以及 All/Any/None 条件组合
//! - 直接持有实现的规则，以及按名字引用注册表的纯数据规则定义
//! - AllMatch / AnyMatch / NoneMatch 三种执行模式，按优先级稳定排序执行
//! - 跨执行共享的引擎上下文

pub mod arguments;
pub mod condition;
pub mod context;
pub mod definition;
pub mod engine;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod operators;
pub mod registry;
pub mod rule;

pub use arguments::Arguments;
pub use condition::{Action, ActionFn, Condition, ConditionFn};
pub use context::EngineContext;
pub use definition::RuleDefinition;
pub use engine::{AnyMatchStrategy, EngineRule, ExecutionMode, RuleEngine};
pub use error::{Result, RuleError, RuleErrorKind};
pub use logger::{LogBuffer, LogSink, noop_sink, tracing_sink};
pub use crate::metrics::describe_metrics;
pub use operators::{LogicalOperator, Operator, all, all_op, any, any_op, combine, none, none_op};
pub use registry::Registry;
pub use rule::Rule;
