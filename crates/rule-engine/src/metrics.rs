//! 引擎指标
//!
//! 基于 metrics crate 记录；未安装 recorder 时所有调用都是空操作。

use crate::engine::ExecutionMode;
use std::time::Duration;

pub const RULE_OUTCOMES_TOTAL: &str = "rule_engine_rule_outcomes_total";
pub const EXECUTIONS_TOTAL: &str = "rule_engine_executions_total";
pub const EXECUTION_DURATION_SECONDS: &str = "rule_engine_execution_duration_seconds";

/// 注册指标描述（出现在导出端的 HELP 注释中）
pub fn describe_metrics() {
    metrics::describe_counter!(RULE_OUTCOMES_TOTAL, "Total number of rule outcomes by mode");
    metrics::describe_counter!(EXECUTIONS_TOTAL, "Total number of engine executions");
    metrics::describe_histogram!(
        EXECUTION_DURATION_SECONDS,
        "Engine execution duration in seconds"
    );
}

pub(crate) fn record_rule_outcome(mode: ExecutionMode, outcome: &'static str) {
    metrics::counter!(RULE_OUTCOMES_TOTAL, "mode" => mode.as_str(), "outcome" => outcome)
        .increment(1);
}

pub(crate) fn record_execution(mode: ExecutionMode, success: bool, elapsed: Duration) {
    let result = if success { "ok" } else { "error" };
    metrics::counter!(EXECUTIONS_TOTAL, "mode" => mode.as_str(), "result" => result).increment(1);
    metrics::histogram!(EXECUTION_DURATION_SECONDS, "mode" => mode.as_str())
        .record(elapsed.as_secs_f64());
}
