//! 规则引擎公共组件
//!
//! 配置加载与可观测性初始化，供引擎库和演示程序共用。

pub mod config;
pub mod observability;

pub use config::{AppConfig, EngineSettings};
pub use observability::ObservabilityConfig;
