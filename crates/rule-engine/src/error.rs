//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则缺少条件")]
    MissingCondition,

    #[error("规则缺少动作")]
    MissingAction,

    #[error("条件未注册: {0}")]
    ConditionNotFound(String),

    #[error("动作未注册: {0}")]
    ActionNotFound(String),

    #[error("条件不满足: {0}")]
    ConditionNotMet(String),

    #[error("动作执行失败: {action}: {source}")]
    ActionFailed {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("规则意外匹配: {0}")]
    UnexpectedMatch(String),

    #[error("没有规则匹配")]
    NoRulesMatched,

    #[error("无效的执行模式: {0}")]
    InvalidMode(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// 错误种类，不携带负载，便于按类型分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleErrorKind {
    MissingCondition,
    MissingAction,
    ConditionNotFound,
    ActionNotFound,
    ConditionNotMet,
    ActionFailed,
    UnexpectedMatch,
    NoRulesMatched,
    InvalidMode,
    Json,
}

impl RuleError {
    pub fn kind(&self) -> RuleErrorKind {
        match self {
            Self::MissingCondition => RuleErrorKind::MissingCondition,
            Self::MissingAction => RuleErrorKind::MissingAction,
            Self::ConditionNotFound(_) => RuleErrorKind::ConditionNotFound,
            Self::ActionNotFound(_) => RuleErrorKind::ActionNotFound,
            Self::ConditionNotMet(_) => RuleErrorKind::ConditionNotMet,
            Self::ActionFailed { .. } => RuleErrorKind::ActionFailed,
            Self::UnexpectedMatch(_) => RuleErrorKind::UnexpectedMatch,
            Self::NoRulesMatched => RuleErrorKind::NoRulesMatched,
            Self::InvalidMode(_) => RuleErrorKind::InvalidMode,
            Self::JsonError(_) => RuleErrorKind::Json,
        }
    }

    /// 错误发生在条件成立之后（动作缺失、未注册或执行失败）
    pub fn condition_held(&self) -> bool {
        matches!(
            self,
            Self::MissingAction | Self::ActionNotFound(_) | Self::ActionFailed { .. }
        )
    }

    /// 是否为"条件不满足"这一正常结果，而非配置或执行故障
    pub fn is_condition_not_met(&self) -> bool {
        matches!(self, Self::ConditionNotMet(_))
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
