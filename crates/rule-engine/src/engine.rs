//! 规则引擎
//!
//! 持有一组有序规则、共享上下文、执行模式和日志回调。每次执行前按优先级升序稳定排序，
//! 再按执行模式汇总各规则的结果：
//!
//! - `AllMatch`：逐条执行，遇到第一个错误立即返回
//! - `AnyMatch`：默认执行全部规则并忽略单条失败；`FirstMatch` 策略下首个成功即返回
//! - `NoneMatch`：任一规则条件成立即视为意外匹配；全部未匹配时再执行一遍所有动作作为兜底

use crate::arguments::Arguments;
use crate::context::EngineContext;
use crate::definition::RuleDefinition;
use crate::error::{Result, RuleError};
use crate::logger::LogSink;
use crate::metrics::{record_execution, record_rule_outcome};
use crate::registry::Registry;
use crate::rule::Rule;
use rule_shared::config::EngineSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// 执行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// 所有规则都必须成功
    #[default]
    AllMatch,
    /// 单条规则失败不影响整体，汇总方式见 `AnyMatchStrategy`
    AnyMatch,
    /// 不允许任何规则成功
    NoneMatch,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllMatch => "all_match",
            Self::AnyMatch => "any_match",
            Self::NoneMatch => "none_match",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all_match" | "allmatch" => Ok(Self::AllMatch),
            "any_match" | "anymatch" => Ok(Self::AnyMatch),
            "none_match" | "nonematch" => Ok(Self::NoneMatch),
            _ => Err(RuleError::InvalidMode(s.to_string())),
        }
    }
}

/// AnyMatch 模式的汇总策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnyMatchStrategy {
    /// 执行全部规则，无论匹配多少条都返回成功
    #[default]
    RunAll,
    /// 首个成功的规则之后停止；一条都没有成功时返回 `NoRulesMatched`
    FirstMatch,
}

impl AnyMatchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunAll => "run_all",
            Self::FirstMatch => "first_match",
        }
    }
}

impl fmt::Display for AnyMatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnyMatchStrategy {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "run_all" => Ok(Self::RunAll),
            "first_match" => Ok(Self::FirstMatch),
            _ => Err(RuleError::InvalidMode(s.to_string())),
        }
    }
}

/// 引擎中的规则：直接持有实现，或按名字引用注册表
#[derive(Debug, Clone)]
pub enum EngineRule {
    Direct(Rule),
    Named(RuleDefinition),
}

impl EngineRule {
    pub fn priority(&self) -> i32 {
        match self {
            Self::Direct(rule) => rule.priority,
            Self::Named(def) => def.priority,
        }
    }

    fn apply(&self, registry: &Registry, ctx: &EngineContext, args: &Arguments) -> Result<()> {
        match self {
            Self::Direct(rule) => rule.apply(ctx, args),
            Self::Named(def) => def.apply(registry, ctx, args),
        }
    }

    fn run_action(
        &self,
        registry: &Registry,
        ctx: &EngineContext,
        args: &Arguments,
    ) -> Result<()> {
        match self {
            Self::Direct(rule) => rule.run_action(ctx, args),
            Self::Named(def) => def.run_action(registry, ctx, args),
        }
    }
}

impl fmt::Display for EngineRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(rule) => fmt::Display::fmt(rule, f),
            Self::Named(def) => fmt::Display::fmt(def, f),
        }
    }
}

impl From<Rule> for EngineRule {
    fn from(rule: Rule) -> Self {
        Self::Direct(rule)
    }
}

impl From<RuleDefinition> for EngineRule {
    fn from(def: RuleDefinition) -> Self {
        Self::Named(def)
    }
}

/// 规则引擎
///
/// 不做内部加锁：添加规则、修改上下文与执行都需要 `&mut self`，跨线程使用由调用方串行化。
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<EngineRule>,
    context: EngineContext,
    mode: ExecutionMode,
    any_match: AnyMatchStrategy,
    logger: LogSink,
    registry: Option<Arc<Registry>>,
}

impl RuleEngine {
    pub fn new(mode: ExecutionMode, logger: LogSink) -> Self {
        Self {
            rules: Vec::new(),
            context: EngineContext::new(),
            mode,
            any_match: AnyMatchStrategy::default(),
            logger,
            registry: None,
        }
    }

    /// 从配置创建引擎
    pub fn from_settings(settings: &EngineSettings, logger: LogSink) -> Result<Self> {
        let mode: ExecutionMode = settings.mode.parse()?;
        let any_match: AnyMatchStrategy = settings.any_match_strategy.parse()?;

        Ok(Self::new(mode, logger).with_any_match_strategy(any_match))
    }

    /// 绑定注册表，用于解析按名字引用的规则
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_context(mut self, context: EngineContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_any_match_strategy(mut self, strategy: AnyMatchStrategy) -> Self {
        self.any_match = strategy;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn any_match_strategy(&self) -> AnyMatchStrategy {
        self.any_match
    }

    pub fn registry(&self) -> Option<&Registry> {
        self.registry.as_deref()
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.set(key, value);
    }

    pub fn get_context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.context
    }

    pub fn add_rule(&mut self, rule: impl Into<EngineRule>) {
        self.rules.push(rule.into());
    }

    pub fn add_rules<I, R>(&mut self, rules: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<EngineRule>,
    {
        self.rules.extend(rules.into_iter().map(Into::into));
    }

    /// 当前规则（最近一次执行后按优先级排序）
    pub fn rules(&self) -> &[EngineRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按当前模式执行全部规则
    #[instrument(skip(self, args), fields(mode = %self.mode, rules = self.rules.len()))]
    pub fn execute(&mut self, args: &Arguments) -> Result<()> {
        // 稳定排序，同优先级保持插入顺序
        self.rules.sort_by_key(EngineRule::priority);

        let start = Instant::now();
        let empty;
        let registry = match self.registry.as_deref() {
            Some(registry) => registry,
            None => {
                empty = Registry::new();
                &empty
            }
        };

        let result = match self.mode {
            ExecutionMode::AllMatch => self.execute_all_match(registry, args),
            ExecutionMode::AnyMatch => self.execute_any_match(registry, args),
            ExecutionMode::NoneMatch => self.execute_none_match(registry, args),
        };

        record_execution(self.mode, result.is_ok(), start.elapsed());
        result
    }

    fn execute_all_match(&self, registry: &Registry, args: &Arguments) -> Result<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            if let Err(e) = rule.apply(registry, &self.context, args) {
                record_rule_outcome(self.mode, "failed");
                warn!(rule = %rule, error = %e, "AllMatch 规则失败");
                self.log(format!("规则失败: {}: {}", rule, e));
                self.log(format!(
                    "在第 {}/{} 条规则处中止",
                    index + 1,
                    self.rules.len()
                ));
                return Err(e);
            }

            record_rule_outcome(self.mode, "matched");
            debug!(rule = %rule, "规则通过");
            self.log(format!("规则通过: {}", rule));
        }

        info!("AllMatch 全部 {} 条规则通过", self.rules.len());
        self.log(format!("全部 {} 条规则通过", self.rules.len()));
        Ok(())
    }

    fn execute_any_match(&self, registry: &Registry, args: &Arguments) -> Result<()> {
        let mut matched = 0usize;

        for rule in &self.rules {
            match rule.apply(registry, &self.context, args) {
                Ok(()) => {
                    matched += 1;
                    record_rule_outcome(self.mode, "matched");
                    debug!(rule = %rule, "规则匹配");
                    self.log(format!("规则匹配: {}", rule));

                    if self.any_match == AnyMatchStrategy::FirstMatch {
                        info!("AnyMatch 首个匹配后停止");
                        self.log(format!("首个匹配规则: {}，停止执行", rule));
                        return Ok(());
                    }
                }
                Err(e) => {
                    record_rule_outcome(self.mode, "not_matched");
                    debug!(rule = %rule, error = %e, "规则未匹配");
                    self.log(format!("规则未匹配: {}: {}", rule, e));
                }
            }
        }

        match self.any_match {
            AnyMatchStrategy::RunAll => {
                info!("AnyMatch 完成: {}/{} 条规则匹配", matched, self.rules.len());
                self.log(format!(
                    "执行完成: {}/{} 条规则匹配",
                    matched,
                    self.rules.len()
                ));
                Ok(())
            }
            AnyMatchStrategy::FirstMatch => {
                warn!("AnyMatch 没有规则匹配");
                self.log("没有规则匹配".to_string());
                Err(RuleError::NoRulesMatched)
            }
        }
    }

    fn execute_none_match(&self, registry: &Registry, args: &Arguments) -> Result<()> {
        for rule in &self.rules {
            // 条件成立即视为匹配；动作缺失或失败不影响判定
            let outcome = rule.apply(registry, &self.context, args);
            match outcome {
                Ok(()) => {}
                Err(ref e) if e.condition_held() => {
                    debug!(rule = %rule, error = %e, "条件成立但动作未完成");
                }
                Err(e) => {
                    record_rule_outcome(self.mode, "not_matched");
                    debug!(rule = %rule, error = %e, "规则未匹配");
                    self.log(format!("规则未匹配: {}: {}", rule, e));
                    continue;
                }
            }

            record_rule_outcome(self.mode, "unexpected_match");
            warn!(rule = %rule, "NoneMatch 规则意外匹配");
            self.log(format!("规则意外匹配: {}", rule));
            self.log("意外匹配，跳过兜底动作".to_string());
            return Err(RuleError::UnexpectedMatch(rule.to_string()));
        }

        self.log("没有规则匹配，执行全部兜底动作".to_string());

        let mut failed = 0usize;
        for rule in &self.rules {
            match rule.run_action(registry, &self.context, args) {
                Ok(()) => {
                    record_rule_outcome(self.mode, "fallback_ok");
                    self.log(format!("兜底动作完成: {}", rule));
                }
                Err(e) => {
                    failed += 1;
                    record_rule_outcome(self.mode, "fallback_failed");
                    warn!(rule = %rule, error = %e, "兜底动作失败");
                    self.log(format!("兜底动作失败: {}: {}", rule, e));
                }
            }
        }

        info!(
            "NoneMatch 完成: {} 条兜底动作, {} 条失败",
            self.rules.len(),
            failed
        );
        self.log(format!(
            "兜底动作执行完成: {} 成功, {} 失败",
            self.rules.len() - failed,
            failed
        ));
        Ok(())
    }

    fn log(&self, message: String) {
        (self.logger)(&message);
    }
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rules)
            .field("context", &self.context)
            .field("mode", &self.mode)
            .field("any_match", &self.any_match)
            .field("registry", &self.registry.is_some())
            .finish()
    }
}
