// ==========================================
// 赞誉量化分配系统 - 分配结果校验
// ==========================================
// 校验项:
// 1. 守恒: 已分配条数 + 未分配条数 = 窗口内赞誉数 × K
// 2. 唯一: 同一量化人不会重复领取同一接收人
// 3. 回避: 量化人不会领取自己关联账号的赞誉
// 任一失败均为内部缺陷，直接中止，不重试
// ==========================================

use crate::domain::assignment::AssignmentResult;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashSet;

pub struct AssignmentVerifier {
    redundancy_factor: usize,
}

impl AssignmentVerifier {
    pub fn new(redundancy_factor: usize) -> Self {
        Self { redundancy_factor }
    }

    pub fn verify(&self, result: &AssignmentResult, window_praise_count: i64) -> EngineResult<()> {
        self.check_accounting(result, window_praise_count)?;
        self.check_uniqueness(result)?;
        self.check_conflicts(result)?;
        Ok(())
    }

    fn check_accounting(&self, result: &AssignmentResult, window_praise_count: i64) -> EngineResult<()> {
        let expected = window_praise_count * self.redundancy_factor as i64;
        let actual = result.assigned_item_count() + result.remaining_item_count;
        if actual != expected {
            return Err(EngineError::InvariantViolation(format!(
                "条数不守恒: assigned={} + remaining={} != {} × {}",
                result.assigned_item_count(),
                result.remaining_item_count,
                window_praise_count,
                self.redundancy_factor
            )));
        }
        Ok(())
    }

    fn check_uniqueness(&self, result: &AssignmentResult) -> EngineResult<()> {
        for quantifier in &result.pool_assignments {
            let mut seen = HashSet::new();
            for receiver in &quantifier.assigned_receivers {
                if !seen.insert(receiver.receiver_id.as_str()) {
                    return Err(EngineError::InvariantViolation(format!(
                        "量化人 {} 重复领取接收人 {}",
                        quantifier.quantifier_id, receiver.receiver_id
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_conflicts(&self, result: &AssignmentResult) -> EngineResult<()> {
        for quantifier in &result.pool_assignments {
            if let Some(receiver) = quantifier
                .assigned_receivers
                .iter()
                .find(|r| quantifier.conflict_ids.contains(&r.receiver_id))
            {
                return Err(EngineError::InvariantViolation(format!(
                    "量化人 {} 被分配到关联账号 {}",
                    quantifier.quantifier_id, receiver.receiver_id
                )));
            }
        }
        Ok(())
    }
}
