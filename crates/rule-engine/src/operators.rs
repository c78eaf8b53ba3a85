//! 条件组合操作符
//!
//! 组合器把多个条件按布尔归约操作符从左到右折叠成一个名为 "Combined" 的新条件。

use crate::condition::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 组合条件的名字
pub const COMBINED: &str = "Combined";

/// 二元布尔归约操作符
pub type Operator = fn(bool, bool) -> bool;

pub fn all_op(a: bool, b: bool) -> bool {
    a && b
}

pub fn any_op(a: bool, b: bool) -> bool {
    a || b
}

pub fn none_op(a: bool, b: bool) -> bool {
    a && !b
}

/// 以 `initial` 为初值，按给定顺序对每个条件的结果做左折叠
///
/// 所有子条件都会被评估，不做短路。
pub fn combine(
    operator: Operator,
    initial: bool,
    conditions: impl IntoIterator<Item = Condition>,
) -> Condition {
    let conditions: Arc<[Condition]> = conditions.into_iter().collect();

    Condition::new(COMBINED, move |ctx, args| {
        conditions
            .iter()
            .fold(initial, |acc, cond| operator(acc, cond.evaluate(ctx, args)))
    })
}

/// 全部为真；零个条件时为真
pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    combine(all_op, true, conditions)
}

/// 任一为真；零个条件时为假
pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    combine(any_op, false, conditions)
}

/// 全部为假；零个条件时为真
pub fn none(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    combine(none_op, true, conditions)
}

/// 逻辑操作符（可从配置或规则数据中选择）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[serde(alias = "AND")]
    All,
    #[serde(alias = "OR")]
    Any,
    None,
}

impl LogicalOperator {
    pub fn operator(self) -> Operator {
        match self {
            Self::All => all_op,
            Self::Any => any_op,
            Self::None => none_op,
        }
    }

    pub fn initial(self) -> bool {
        match self {
            Self::All | Self::None => true,
            Self::Any => false,
        }
    }

    pub fn reduce(self, acc: bool, value: bool) -> bool {
        (self.operator())(acc, value)
    }

    pub fn combine(self, conditions: impl IntoIterator<Item = Condition>) -> Condition {
        combine(self.operator(), self.initial(), conditions)
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::Any => write!(f, "ANY"),
            Self::None => write!(f, "NONE"),
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" | "AND" => Ok(Self::All),
            "ANY" | "OR" => Ok(Self::Any),
            "NONE" => Ok(Self::None),
            _ => Err(format!("未知的逻辑操作符: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;
    use crate::context::EngineContext;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn constant(value: bool) -> Condition {
        let name = if value { "trueFn" } else { "falseFn" };
        Condition::new(name, move |_, _| value)
    }

    fn eval(cond: &Condition) -> bool {
        cond.evaluate(&EngineContext::new(), &Arguments::new())
    }

    /// 枚举长度 0..=4 的所有真值组合
    fn truth_tables() -> Vec<Vec<bool>> {
        (0..=4usize)
            .flat_map(|n| {
                (0..(1u32 << n))
                    .map(move |bits| (0..n).map(|i| bits & (1 << i) != 0).collect::<Vec<bool>>())
            })
            .collect()
    }

    #[test]
    fn test_combine_all_op() {
        assert!(eval(&combine(all_op, true, vec![constant(true), constant(true)])));
        assert!(!eval(&combine(all_op, true, vec![constant(true), constant(false)])));
    }

    #[test]
    fn test_combine_any_op() {
        assert!(eval(&combine(any_op, false, vec![constant(false), constant(true)])));
        assert!(!eval(&combine(any_op, false, vec![constant(false), constant(false)])));
    }

    #[test]
    fn test_combine_none_op() {
        assert!(!eval(&combine(none_op, true, vec![constant(true), constant(true)])));
        assert!(eval(&combine(none_op, true, vec![constant(false), constant(false)])));
    }

    #[test]
    fn test_empty_combinations() {
        assert!(eval(&all(Vec::new())));
        assert!(!eval(&any(Vec::new())));
        assert!(eval(&none(Vec::new())));
    }

    #[test]
    fn test_combined_name() {
        assert_eq!(all(vec![constant(true)]).name(), COMBINED);
    }

    #[test]
    fn test_all_matches_conjunction() {
        for table in truth_tables() {
            let cond = all(table.iter().map(|&v| constant(v)));
            assert_eq!(eval(&cond), table.iter().all(|&v| v), "{:?}", table);
        }
    }

    #[test]
    fn test_any_matches_disjunction() {
        for table in truth_tables() {
            let cond = any(table.iter().map(|&v| constant(v)));
            assert_eq!(eval(&cond), table.iter().any(|&v| v), "{:?}", table);
        }
    }

    #[test]
    fn test_none_left_fold_matches_no_true() {
        // 覆盖 0 个、1 个以及多个真值穿插在假值之间的情况
        for table in truth_tables() {
            let cond = none(table.iter().map(|&v| constant(v)));
            assert_eq!(eval(&cond), !table.iter().any(|&v| v), "{:?}", table);
        }
    }

    #[test]
    fn test_combine_evaluates_every_condition() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = |value: bool| {
            let calls = Arc::clone(&calls);
            Condition::new("counted", move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                value
            })
        };

        let cond = all(vec![counted(false), counted(true), counted(true)]);
        assert!(!eval(&cond));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unbound_member_counts_as_false() {
        assert!(!eval(&all(vec![constant(true), Condition::unbound("missing")])));
        assert!(eval(&none(vec![Condition::unbound("missing")])));
    }

    #[test]
    fn test_logical_operator_serde_accepts_aliases() {
        for (text, expected) in [
            ("\"ALL\"", LogicalOperator::All),
            ("\"AND\"", LogicalOperator::All),
            ("\"ANY\"", LogicalOperator::Any),
            ("\"OR\"", LogicalOperator::Any),
            ("\"NONE\"", LogicalOperator::None),
        ] {
            let parsed: LogicalOperator = serde_json::from_str(text).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(text.trim_matches('"').parse::<LogicalOperator>().unwrap(), expected);
        }
        // 序列化仍输出规范名称
        assert_eq!(serde_json::to_string(&LogicalOperator::All).unwrap(), "\"ALL\"");
    }

    #[test]
    fn test_logical_operator() {
        assert_eq!("and".parse::<LogicalOperator>(), Ok(LogicalOperator::All));
        assert_eq!("NONE".parse::<LogicalOperator>(), Ok(LogicalOperator::None));
        assert!("xor".parse::<LogicalOperator>().is_err());

        assert!(!LogicalOperator::None.reduce(true, true));
        assert!(eval(
            &LogicalOperator::Any.combine(vec![constant(false), constant(true)])
        ));
        assert_eq!(LogicalOperator::Any.to_string(), "ANY");
    }
}
