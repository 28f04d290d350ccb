// ==========================================
// 赞誉量化分配系统 - 引擎层错误类型
// ==========================================
// 分类:
// - 前置条件不满足: 立即返回，不做任何计算
// - 分配不足: 重试耗尽仍有未分配工作，不做任何写入
// - 不变量破坏: 内部缺陷，与分配不足严格区分
// - 替换冲突: 不做任何写入
// ==========================================

use crate::config::ConfigError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 前置条件 =====
    #[error("前置条件不满足: {0}")]
    Precondition(String),

    #[error("周期状态不符: period_id={period_id}, expected={expected}, actual={actual}")]
    InvalidPeriodState {
        period_id: String,
        expected: String,
        actual: String,
    },

    #[error("无效的周期状态转换: period_id={period_id}, from={from} to={to}")]
    InvalidStateTransition {
        period_id: String,
        from: String,
        to: String,
    },

    #[error("周期已存在量化记录: period_id={period_id}, count={count}")]
    AlreadyAssigned { period_id: String, count: i64 },

    #[error("量化人池不足: pool_size={pool_size}, required={required}")]
    InsufficientPool { pool_size: usize, required: usize },

    #[error("接收人数量不足: receivers={receivers}, required={required}")]
    InsufficientReceivers { receivers: usize, required: usize },

    // ===== 分配不足 =====
    #[error(
        "分配不足: attempts={attempts}, remaining_assignments={remaining_assignments}, remaining_items={remaining_items}"
    )]
    Deficit {
        attempts: usize,
        remaining_assignments: usize,
        remaining_items: i64,
    },

    // ===== 内部缺陷 =====
    #[error("分配不变量被破坏: {0}")]
    InvariantViolation(String),

    // ===== 替换冲突 =====
    #[error("量化人替换冲突: {0}")]
    ReplacementConflict(String),

    // ===== 下游错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// 是否属于前置条件类错误（调用方可修正后重试）
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::Precondition(_)
                | EngineError::InvalidPeriodState { .. }
                | EngineError::InvalidStateTransition { .. }
                | EngineError::AlreadyAssigned { .. }
                | EngineError::InsufficientPool { .. }
                | EngineError::InsufficientReceivers { .. }
        )
    }
}

/// 提交阶段的并发拒绝映射为前置条件错误
pub(crate) fn from_commit_error(err: RepositoryError) -> EngineError {
    match err {
        RepositoryError::AlreadyAssigned { period_id, count } => {
            EngineError::AlreadyAssigned { period_id, count }
        }
        RepositoryError::StalePeriodState {
            period_id,
            expected,
            actual,
        } => EngineError::InvalidPeriodState {
            period_id,
            expected,
            actual,
        },
        other => EngineError::Repository(other),
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
