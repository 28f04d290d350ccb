// ==========================================
// 赞誉量化分配系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod period_repo;
pub mod praise_repo;
pub mod quantification_repo;
pub mod quantifier_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use period_repo::PeriodRepository;
pub use praise_repo::PraiseRepository;
pub use quantification_repo::QuantificationRepository;
pub use quantifier_repo::QuantifierRepository;

use crate::domain::period::PeriodWindow;

/// 周期窗口 → SQL 参数 (start_exclusive, end_inclusive)
pub(crate) fn window_params(window: &PeriodWindow) -> (Option<String>, String) {
    (
        window
            .start_exclusive
            .map(|d| d.format("%Y-%m-%d").to_string()),
        window.end_inclusive.format("%Y-%m-%d").to_string(),
    )
}
