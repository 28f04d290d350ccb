// ==========================================
// 赞誉量化分配系统 - 量化人分配 API
// ==========================================
// 职责: 对外三项操作 + 周期汇总/关闭
// - preview_pool_requirements: 量化人池规模预检（只读）
// - commit_assignment: 分配并提交
// - replace_quantifier: 量化人替换
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::AssignmentConfigReader;
use crate::domain::action_log::ActionLog;
use crate::domain::assignment::PoolSizeReport;
use crate::domain::period::{Period, PeriodDetails};
use crate::engine::{
    AssignmentOrchestrator, AssignmentRepositories, AssignmentSummary,
    QuantifierReplacementService, ReplaceQuantifierRequest, ReplacementOutcome,
};

// ==========================================
// AssignmentApi - 量化人分配 API
// ==========================================

/// 量化人分配API
///
/// 职责：
/// 1. 入参校验
/// 2. 调用编排器/替换服务
/// 3. 引擎错误转换为 ApiError
pub struct AssignmentApi<C>
where
    C: AssignmentConfigReader,
{
    orchestrator: Arc<AssignmentOrchestrator<C>>,
    replacement: Arc<QuantifierReplacementService>,
    repos: AssignmentRepositories,
}

impl<C> AssignmentApi<C>
where
    C: AssignmentConfigReader,
{
    /// 创建新的AssignmentApi实例
    pub fn new(
        orchestrator: Arc<AssignmentOrchestrator<C>>,
        replacement: Arc<QuantifierReplacementService>,
        repos: AssignmentRepositories,
    ) -> Self {
        Self {
            orchestrator,
            replacement,
            repos,
        }
    }

    /// 量化人池规模预检
    ///
    /// # 参数
    /// - period_id: 周期ID
    ///
    /// # 返回
    /// - Ok(PoolSizeReport): 现有池规模、所需人数、缺口
    /// - Err(ApiError): API错误
    pub async fn preview_pool_requirements(&self, period_id: &str) -> ApiResult<PoolSizeReport> {
        require_non_empty(period_id, "周期ID")?;
        Ok(self.orchestrator.verify_pool_size(period_id).await?)
    }

    /// 分配量化人并提交
    ///
    /// # 参数
    /// - period_id: 周期ID
    /// - operator: 操作人
    pub async fn commit_assignment(
        &self,
        period_id: &str,
        operator: &str,
    ) -> ApiResult<AssignmentSummary> {
        require_non_empty(period_id, "周期ID")?;
        require_non_empty(operator, "操作人")?;
        Ok(self.orchestrator.assign(period_id, operator).await?)
    }

    /// 替换量化人
    ///
    /// # 参数
    /// - period_id: 周期ID
    /// - current_quantifier_id: 被替换的量化人
    /// - new_quantifier_id: 接替的量化人
    /// - operator: 操作人
    pub async fn replace_quantifier(
        &self,
        period_id: &str,
        current_quantifier_id: &str,
        new_quantifier_id: &str,
        operator: &str,
    ) -> ApiResult<ReplacementOutcome> {
        require_non_empty(period_id, "周期ID")?;
        require_non_empty(current_quantifier_id, "当前量化人ID")?;
        require_non_empty(new_quantifier_id, "新量化人ID")?;
        require_non_empty(operator, "操作人")?;

        let request = ReplaceQuantifierRequest {
            period_id: period_id.to_string(),
            current_quantifier_id: current_quantifier_id.to_string(),
            new_quantifier_id: new_quantifier_id.to_string(),
            actor: operator.to_string(),
        };
        Ok(self.replacement.replace(&request).await?)
    }

    /// 查询周期汇总
    pub fn period_details(&self, period_id: &str) -> ApiResult<PeriodDetails> {
        require_non_empty(period_id, "周期ID")?;
        Ok(self.repos.period_details(period_id)?)
    }

    /// 查询全部周期
    pub fn list_periods(&self) -> ApiResult<Vec<Period>> {
        Ok(self.repos.period_repo.list_all()?)
    }

    /// 关闭周期
    pub async fn close_period(&self, period_id: &str, operator: &str) -> ApiResult<()> {
        require_non_empty(period_id, "周期ID")?;
        require_non_empty(operator, "操作人")?;
        Ok(self.orchestrator.close_period(period_id, operator).await?)
    }

    /// 查询周期操作日志（按时间倒序）
    pub fn list_action_logs(&self, period_id: &str) -> ApiResult<Vec<ActionLog>> {
        require_non_empty(period_id, "周期ID")?;
        Ok(self.repos.action_log_repo.find_by_period_id(period_id)?)
    }
}

fn require_non_empty(value: &str, field: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}
