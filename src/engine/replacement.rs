// ==========================================
// 赞誉量化分配系统 - 量化人替换服务
// ==========================================
// 职责: 将某量化人在当前周期的全部量化记录整体转给另一量化人
// 前置条件: 周期为 QUANTIFY
// 拒绝条件（均不写入）:
// - 新旧量化人相同
// - 任一量化人不存在
// - 旧量化人在本周期没有量化记录
// - 新量化人已持有同一赞誉的量化记录
// - 新量化人是受影响赞誉的接收人（关联账号）
// 成功: 记录重置为中性，受影响赞誉得分置 0，写入审计
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::period::PeriodDetails;
use crate::domain::praise::Praise;
use crate::domain::types::PeriodStatus;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::locks::PeriodLocks;
use crate::engine::repositories::AssignmentRepositories;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceQuantifierRequest {
    pub period_id: String,
    pub current_quantifier_id: String,
    pub new_quantifier_id: String,
    pub actor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementOutcome {
    pub period: PeriodDetails,
    pub affected_praise: Vec<Praise>,
    pub moved_count: usize,
}

pub struct QuantifierReplacementService {
    repos: AssignmentRepositories,
    locks: Arc<PeriodLocks>,
}

impl QuantifierReplacementService {
    pub fn new(repos: AssignmentRepositories, locks: Arc<PeriodLocks>) -> Self {
        Self { repos, locks }
    }

    #[instrument(skip(self, request), fields(
        period_id = %request.period_id,
        current = %request.current_quantifier_id,
        new = %request.new_quantifier_id
    ))]
    pub async fn replace(&self, request: &ReplaceQuantifierRequest) -> EngineResult<ReplacementOutcome> {
        let current_id = request.current_quantifier_id.as_str();
        let new_id = request.new_quantifier_id.as_str();

        if current_id == new_id {
            return Err(EngineError::ReplacementConflict(
                "新量化人与当前量化人相同".to_string(),
            ));
        }

        let _guard = self.locks.acquire(&request.period_id).await;

        let period = self.repos.period_repo.get(&request.period_id)?;
        if !period.is_quantify() {
            return Err(EngineError::InvalidPeriodState {
                period_id: period.period_id.clone(),
                expected: PeriodStatus::Quantify.to_string(),
                actual: period.status.to_string(),
            });
        }

        for id in [current_id, new_id] {
            if !self.repos.quantifier_repo.exists(id)? {
                return Err(EngineError::Precondition(format!("量化人不存在: {}", id)));
            }
        }

        let window = self.repos.period_repo.window_for(&period)?;
        let current_records = self
            .repos
            .quantification_repo
            .find_by_quantifier_in_window(current_id, &window)?;
        if current_records.is_empty() {
            return Err(EngineError::Precondition(format!(
                "量化人 {} 在本周期没有量化记录",
                current_id
            )));
        }

        // 同一赞誉不能出现两条属于新量化人的记录
        let held_by_new: HashSet<String> = self
            .repos
            .quantification_repo
            .find_by_quantifier_in_window(new_id, &window)?
            .into_iter()
            .map(|q| q.praise_id)
            .collect();
        if let Some(dup) = current_records.iter().find(|q| held_by_new.contains(&q.praise_id)) {
            return Err(EngineError::ReplacementConflict(format!(
                "量化人 {} 已在量化赞誉 {}",
                new_id, dup.praise_id
            )));
        }

        let mut praise_ids: Vec<String> = current_records.iter().map(|q| q.praise_id.clone()).collect();
        praise_ids.sort();
        praise_ids.dedup();

        // 新量化人不能量化发给自己的赞誉
        let conflict_ids = self.repos.quantifier_repo.conflict_ids_for(new_id)?;
        let affected = self.repos.praise_repo.find_by_ids(&praise_ids)?;
        if let Some(own) = affected.iter().find(|p| conflict_ids.contains(&p.receiver_id)) {
            return Err(EngineError::ReplacementConflict(format!(
                "量化人 {} 是赞誉 {} 的接收人",
                new_id, own.praise_id
            )));
        }

        let quantification_ids: Vec<String> = current_records
            .iter()
            .map(|q| q.quantification_id.clone())
            .collect();
        let moved = self.repos.quantification_repo.reassign(
            &quantification_ids,
            current_id,
            new_id,
            &praise_ids,
            Utc::now().naive_utc(),
        )?;

        let log = ActionLog::new(
            Some(request.period_id.clone()),
            ActionType::ReplaceQuantifier,
            &request.actor,
        )
        .with_payload(&json!({
            "current_quantifier_id": current_id,
            "new_quantifier_id": new_id,
            "quantification_ids": &quantification_ids,
            "praise_ids": &praise_ids,
        }))
        .with_detail(format!(
            "量化人 {} 的 {} 条量化记录已转给 {}",
            current_id, moved, new_id
        ));
        self.repos.action_log_repo.insert(&log)?;

        info!(moved, affected_praise = praise_ids.len(), "量化人替换完成");

        Ok(ReplacementOutcome {
            period: self.repos.period_details(&request.period_id)?,
            affected_praise: self.repos.praise_repo.find_by_ids(&praise_ids)?,
            moved_count: moved,
        })
    }
}
