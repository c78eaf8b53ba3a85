//! 规则引擎集成测试
//!
//! 测试注册表、规则定义、执行模式与上下文的完整工作流。

use rule_engine::{
    Action, AnyMatchStrategy, Arguments, Condition, EngineContext, ExecutionMode, LogBuffer,
    Registry, Rule, RuleDefinition, RuleEngine, RuleError, RuleErrorKind, any, context::keys,
    noop_sink,
};
use rule_shared::config::AppConfig;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 动作调用计数
#[derive(Default)]
struct Counters {
    even: AtomicUsize,
    positive: AtomicUsize,
}

/// 创建测试注册表：isEven / isPositive 两个条件，printIsEven / printIsPositive 两个动作
fn create_registry(counters: &Arc<Counters>) -> Registry {
    let mut registry = Registry::new();

    registry.add_condition("isEven", |_, args| {
        args.get_i64("number").is_some_and(|n| n % 2 == 0)
    });
    registry.add_condition("isPositive", |_, args| {
        args.get_i64("number").is_some_and(|n| n > 0)
    });

    let c = Arc::clone(counters);
    registry.add_action("printIsEven", move |_, args| {
        args.get_i64("number")
            .ok_or_else(|| anyhow::anyhow!("{:?} is not a number", args.get("number")))?;
        c.even.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let c = Arc::clone(counters);
    registry.add_action("printIsPositive", move |_, args| {
        args.get_i64("number")
            .ok_or_else(|| anyhow::anyhow!("{:?} is not a number", args.get("number")))?;
        c.positive.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    registry.add_action("printErr", |_, _| anyhow::bail!("this shouldn't run"));

    registry
}

fn number(n: i64) -> Arguments {
    Arguments::new().with("number", n)
}

/// 以 isEven / isPositive 两条按名字引用的规则构建引擎
fn create_engine(mode: ExecutionMode, registry: Arc<Registry>, n: i64) -> RuleEngine {
    let mut engine = RuleEngine::new(mode, noop_sink()).with_registry(registry);

    let mut rule1 = RuleDefinition::when("isEven", number(n), 1);
    rule1.action = "printIsEven".to_string();
    engine.add_rule(rule1);

    let mut rule2 = RuleDefinition::when("isPositive", number(n), 2);
    rule2.action = "printIsPositive".to_string();
    engine.add_rule(rule2);

    engine
}

// ==================== 执行模式测试 ====================

#[test]
fn test_all_match_with_registry() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let mut engine = create_engine(ExecutionMode::AllMatch, registry, 4);

    engine.execute(&number(4)).unwrap();
    assert_eq!(counters.even.load(Ordering::SeqCst), 1);
    assert_eq!(counters.positive.load(Ordering::SeqCst), 1);
}

#[test]
fn test_any_match_with_registry() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let mut engine = create_engine(ExecutionMode::AnyMatch, registry, 3);

    engine.execute(&number(3)).unwrap();
    assert_eq!(counters.even.load(Ordering::SeqCst), 0);
    assert_eq!(counters.positive.load(Ordering::SeqCst), 1);
}

#[test]
fn test_any_match_first_match_with_registry() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let mut engine = create_engine(ExecutionMode::AnyMatch, registry, -3)
        .with_any_match_strategy(AnyMatchStrategy::FirstMatch);

    let err = engine.execute(&number(-3)).unwrap_err();
    assert!(matches!(err, RuleError::NoRulesMatched));
}

#[test]
fn test_none_match_runs_fallbacks() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let mut engine = create_engine(ExecutionMode::NoneMatch, registry, -3);

    engine.execute(&number(-3)).unwrap();
    // 第一轮都未匹配，第二轮每个动作各执行一次
    assert_eq!(counters.even.load(Ordering::SeqCst), 1);
    assert_eq!(counters.positive.load(Ordering::SeqCst), 1);
}

#[test]
fn test_none_match_unexpected_match() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let mut engine = create_engine(ExecutionMode::NoneMatch, registry, 4);

    let err = engine.execute(&number(4)).unwrap_err();
    assert_eq!(err.kind(), RuleErrorKind::UnexpectedMatch);
}

// ==================== 错误路径测试 ====================

#[test]
fn test_condition_not_met() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let mut engine = RuleEngine::new(ExecutionMode::AllMatch, noop_sink()).with_registry(registry);

    engine.add_rule(RuleDefinition::when("isEven", number(5), 1).then("printErr"));

    let err = engine.execute(&number(5)).unwrap_err();
    assert!(matches!(err, RuleError::ConditionNotMet(ref name) if name == "isEven"));
}

#[test]
fn test_invalid_action() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let mut engine = RuleEngine::new(ExecutionMode::AllMatch, noop_sink()).with_registry(registry);

    engine.add_rule(RuleDefinition::when("isEven", number(4), 1).then("missingInAction"));

    let err = engine.execute(&number(4)).unwrap_err();
    assert!(matches!(err, RuleError::ActionNotFound(ref name) if name == "missingInAction"));
}

#[test]
fn test_action_error_is_downcastable() {
    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    let rule = Rule::new(
        Condition::new("always", |_, _| true),
        Action::new("spend", |_, _| Err(QuotaExceeded.into())),
        1,
    );

    let err = rule.apply(&EngineContext::new(), &Arguments::new()).unwrap_err();
    match err {
        RuleError::ActionFailed { action, source } => {
            assert_eq!(action, "spend");
            assert!(source.downcast_ref::<QuotaExceeded>().is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ==================== 上下文测试 ====================

#[test]
fn test_context() {
    let mut engine = RuleEngine::new(ExecutionMode::AllMatch, noop_sink());

    engine.set_context("key", "value");
    assert_eq!(engine.get_context("key"), Some(&json!("value")));
}

#[test]
fn test_force_pass_context() {
    let counters = Arc::new(Counters::default());
    let mut registry = create_registry(&counters);
    registry.add_condition("isEvenOrForced", |ctx, args| {
        ctx.force_pass() || args.get_i64("number").is_some_and(|n| n % 2 == 0)
    });

    let mut engine = RuleEngine::new(ExecutionMode::AllMatch, noop_sink())
        .with_registry(Arc::new(registry))
        .with_context(EngineContext::new().with(keys::FORCE_PASS, true));
    engine.add_rule(RuleDefinition::new("isEvenOrForced", "printIsEven", 1));

    for n in [1, 3, 5] {
        engine.execute(&number(n)).unwrap();
    }
    assert_eq!(counters.even.load(Ordering::SeqCst), 3);
}

// ==================== 注册表与子引擎 ====================

#[test]
fn test_sub_engines_are_not_chained() {
    let counters = Arc::new(Counters::default());
    let base = Arc::new(create_registry(&counters));

    let mut catalog = Registry::new();
    catalog.add_engine("evens", create_engine(ExecutionMode::AllMatch, Arc::clone(&base), 4));

    let mut parent = RuleEngine::new(ExecutionMode::AllMatch, noop_sink());
    parent.add_rule(Rule::new(
        Condition::new("always", |_, _| true),
        Action::new("noop", |_, _| Ok(())),
        1,
    ));
    parent.execute(&number(4)).unwrap();

    // 父引擎执行不会触发子引擎
    assert_eq!(counters.even.load(Ordering::SeqCst), 0);

    let child = catalog.get_engine_mut("evens").unwrap();
    child.execute(&number(4)).unwrap();
    assert_eq!(counters.even.load(Ordering::SeqCst), 1);
}

// ==================== 规则定义加载 ====================

#[test]
fn test_definitions_from_json() {
    let counters = Arc::new(Counters::default());
    let registry = Arc::new(create_registry(&counters));
    let logs = LogBuffer::new();

    let rules = RuleDefinition::from_json_list(
        r#"
        [
            {"name": "positive", "condition": "isPositive", "action": "printIsPositive", "priority": 5},
            {"name": "even", "condition": "isEven", "action": "printIsEven", "priority": 1}
        ]
        "#,
    )
    .unwrap();

    let mut engine = RuleEngine::new(ExecutionMode::AllMatch, logs.sink()).with_registry(registry);
    engine.add_rules(rules);
    engine.execute(&number(2)).unwrap();

    let lines = logs.lines();
    assert!(lines[0].contains("even"));
    assert!(lines[1].contains("positive"));
}

#[test]
fn test_combined_condition_in_registry() {
    let counters = Arc::new(Counters::default());
    let mut registry = create_registry(&counters);
    let even = registry.get_condition("isEven").cloned().unwrap();
    let positive = registry.get_condition("isPositive").cloned().unwrap();
    registry.insert_condition("evenOrPositive", any(vec![even, positive]));

    let mut engine = RuleEngine::new(ExecutionMode::AllMatch, noop_sink())
        .with_registry(Arc::new(registry));
    engine.add_rule(RuleDefinition::new("evenOrPositive", "printIsEven", 1));

    engine.execute(&number(-2)).unwrap();
    engine.execute(&number(3)).unwrap();
    assert!(engine.execute(&number(-3)).is_err());
    assert_eq!(counters.even.load(Ordering::SeqCst), 2);
}

// ==================== 配置驱动 ====================

#[test]
fn test_engine_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("rule-engine.toml"),
        "[engine]\nmode = \"none_match\"\n",
    )
    .unwrap();

    let config = AppConfig::load_from("rule-engine", dir.path()).unwrap();
    let engine = RuleEngine::from_settings(&config.engine, noop_sink()).unwrap();

    assert_eq!(engine.mode(), ExecutionMode::NoneMatch);
    assert_eq!(engine.any_match_strategy(), AnyMatchStrategy::RunAll);
}
