// ==========================================
// 赞誉量化分配系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合分配引擎所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::domain::period::PeriodDetails;
use crate::repository::{
    ActionLogRepository, PeriodRepository, PraiseRepository, QuantificationRepository,
    QuantifierRepository, RepositoryResult,
};

/// 分配引擎仓储集合
///
/// # 包含的仓储
/// - `period_repo`: 周期与状态迁移
/// - `praise_repo`: 赞誉与接收人聚合
/// - `quantifier_repo`: 量化人池与关联账号
/// - `quantification_repo`: 量化记录
/// - `action_log_repo`: 操作日志
#[derive(Clone)]
pub struct AssignmentRepositories {
    pub period_repo: Arc<PeriodRepository>,
    pub praise_repo: Arc<PraiseRepository>,
    pub quantifier_repo: Arc<QuantifierRepository>,
    pub quantification_repo: Arc<QuantificationRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AssignmentRepositories {
    /// 所有仓储共享同一连接
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            period_repo: Arc::new(PeriodRepository::new(conn.clone())),
            praise_repo: Arc::new(PraiseRepository::new(conn.clone())),
            quantifier_repo: Arc::new(QuantifierRepository::new(conn.clone())),
            quantification_repo: Arc::new(QuantificationRepository::new(conn.clone())),
            action_log_repo: Arc::new(ActionLogRepository::new(conn)),
        }
    }

    /// 周期汇总: 周期 + 窗口 + 接收人/量化人统计
    pub fn period_details(&self, period_id: &str) -> RepositoryResult<PeriodDetails> {
        let period = self.period_repo.get(period_id)?;
        let window = self.period_repo.window_for(&period)?;
        let receivers = self.praise_repo.summarize_receivers(&window)?;
        let quantifiers = self.quantification_repo.summarize_quantifiers(&window)?;

        Ok(PeriodDetails {
            period,
            window,
            receivers,
            quantifiers,
        })
    }
}
