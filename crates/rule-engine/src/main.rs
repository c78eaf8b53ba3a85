//! 规则引擎演示程序
//!
//! 加载配置与日志后，用内置的条件/动作和规则定义，对命令行传入的每个数字执行一次规则集。
//!
//! ```text
//! RULES__ENGINE__MODE=none_match rule-engine 4 -3
//! ```

use anyhow::{Context, Result};
use rule_engine::{
    Arguments, Registry, RuleDefinition, RuleEngine, describe_metrics, none, tracing_sink,
};
use rule_shared::config::AppConfig;
use rule_shared::observability;
use std::sync::Arc;
use tracing::{info, warn};

const DEMO_RULES: &str = r#"
[
    {"name": "even", "condition": "isEven", "action": "printIsEven", "priority": 1},
    {"name": "positive", "condition": "isPositive", "action": "printIsPositive", "priority": 2},
    {"name": "neither", "condition": "isOddAndNotPositive", "action": "printNeither", "priority": 3}
]
"#;

fn main() -> Result<()> {
    let config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    observability::init(&config.observability)?;
    describe_metrics();

    info!(
        mode = %config.engine.mode,
        environment = %config.environment,
        "Starting rule-engine demo..."
    );

    let registry = Arc::new(demo_registry());
    let rules = RuleDefinition::from_json_list(DEMO_RULES).context("内置规则解析失败")?;

    let mut engine = RuleEngine::from_settings(&config.engine, tracing_sink())?
        .with_registry(registry);
    engine.add_rules(rules);

    let numbers = parse_numbers(std::env::args().skip(1));
    for number in numbers {
        let args = Arguments::new().with("number", number);
        match engine.execute(&args) {
            Ok(()) => info!(number, "规则集执行成功"),
            Err(e) => warn!(number, error = %e, "规则集未满足"),
        }
    }

    Ok(())
}

/// 无法解析的参数会被跳过；没有参数时使用默认样例
fn parse_numbers(args: impl Iterator<Item = String>) -> Vec<i64> {
    let numbers: Vec<i64> = args
        .filter_map(|arg| match arg.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("忽略非数字参数: {}", arg);
                None
            }
        })
        .collect();

    if numbers.is_empty() {
        vec![4, 3, -3]
    } else {
        numbers
    }
}

fn demo_registry() -> Registry {
    let mut registry = Registry::new();

    registry.add_condition("isEven", |_, args| {
        args.get_i64("number").is_some_and(|n| n % 2 == 0)
    });
    registry.add_condition("isPositive", |_, args| {
        args.get_i64("number").is_some_and(|n| n > 0)
    });

    let even = registry.get_condition("isEven").cloned();
    let positive = registry.get_condition("isPositive").cloned();
    registry.insert_condition(
        "isOddAndNotPositive",
        none(even.into_iter().chain(positive)),
    );

    for (name, label) in [
        ("printIsEven", "even"),
        ("printIsPositive", "positive"),
        ("printNeither", "odd and not positive"),
    ] {
        registry.add_action(name, move |_, args| {
            let n = args
                .get_i64("number")
                .with_context(|| format!("{:?} is not a number", args.get("number")))?;
            info!("Success: {} is {}!", n, label);
            Ok(())
        });
    }

    registry
}
