// ==========================================
// 赞誉量化分配系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将仓储/引擎错误转换为调用方可理解的错误
// 分类与引擎层一致: 前置条件 / 分配不足 / 内部缺陷 / 替换冲突
// ==========================================

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("前置条件不满足: {0}")]
    PreconditionFailed(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("量化人不足: remaining_assignments={remaining_assignments}, remaining_items={remaining_items}")]
    AssignmentDeficit {
        remaining_assignments: usize,
        remaining_items: i64,
    },

    #[error("量化人替换冲突: {0}")]
    ReplacementConflict(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 配置错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制
            RepositoryError::StalePeriodState {
                period_id,
                expected,
                actual,
            } => ApiError::PreconditionFailed(format!(
                "周期{}状态已变化（期望{}，实际{}）",
                period_id, expected, actual
            )),
            RepositoryError::AlreadyAssigned { period_id, count } => ApiError::PreconditionFailed(
                format!("周期{}已存在{}条量化记录", period_id, count),
            ),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("字段{}数据异常: {}", field, message))
            }

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Precondition(msg) => ApiError::PreconditionFailed(msg),
            EngineError::InvalidPeriodState {
                period_id,
                expected,
                actual,
            } => ApiError::PreconditionFailed(format!(
                "周期{}状态为{}，需要{}",
                period_id, actual, expected
            )),
            EngineError::InvalidStateTransition { from, to, .. } => {
                ApiError::InvalidStateTransition { from, to }
            }
            EngineError::AlreadyAssigned { period_id, count } => ApiError::PreconditionFailed(
                format!("周期{}已存在{}条量化记录", period_id, count),
            ),
            EngineError::InsufficientPool { pool_size, required } => ApiError::PreconditionFailed(
                format!("量化人池不足: 现有{}人，至少需要{}人", pool_size, required),
            ),
            EngineError::InsufficientReceivers { receivers, required } => {
                ApiError::PreconditionFailed(format!(
                    "接收人数量不足: 现有{}人，至少需要{}人",
                    receivers, required
                ))
            }
            EngineError::Deficit {
                remaining_assignments,
                remaining_items,
                ..
            } => ApiError::AssignmentDeficit {
                remaining_assignments,
                remaining_items,
            },
            EngineError::InvariantViolation(msg) => {
                ApiError::InternalError(format!("分配不变量被破坏: {}", msg))
            }
            EngineError::ReplacementConflict(msg) => ApiError::ReplacementConflict(msg),
            EngineError::Repository(e) => ApiError::from(e),
            EngineError::Config(e) => ApiError::from(e),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
