// ==========================================
// 赞誉量化分配系统 - 冲突消解引擎
// ==========================================
// 职责: 将分配箱逐个匹配给量化人，避开利益冲突
// 输入: 分配箱序列 + 量化人池（均为后进先出栈）
// 输出: AssignmentResult
// ==========================================
// 规则:
// - 弹出一个量化人、一个分配箱
// - 无冲突: 量化人领取整箱，退出量化人池
// - 有冲突且该配对重试次数已达上限: 该箱永久放弃，量化人放回池尾
// - 有冲突且未达上限: 量化人放回池尾，分配箱放到队首，记录配对
// - 量化人池耗尽: 剩余箱全部计入未分配
// ==========================================
// 状态显式传递: 每一步消费旧状态、返回新状态
// ==========================================

use crate::domain::assignment::{AssignmentBin, AssignmentResult};
use crate::domain::quantifier::Quantifier;
use std::collections::{HashMap, VecDeque};

// ==========================================
// ResolverState - 消解过程状态
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ResolverState {
    pub bins: VecDeque<AssignmentBin>,        // 末尾为栈顶
    pub pool: Vec<Quantifier>,                // 末尾为栈顶
    pub seen_pairings: HashMap<String, usize>, // 配对ID → 已重试次数
    pub assigned: Vec<Quantifier>,
    pub skipped: Vec<AssignmentBin>,
}

impl ResolverState {
    pub fn new(bins: Vec<AssignmentBin>, pool: Vec<Quantifier>) -> Self {
        Self {
            bins: bins.into_iter().collect(),
            pool,
            ..Default::default()
        }
    }

    pub fn is_finished(&self) -> bool {
        self.bins.is_empty()
    }

    fn into_result(self) -> AssignmentResult {
        let mut remaining_item_count = 0i64;
        let mut remaining_assignments_count = 0usize;
        for bin in self.skipped.iter().chain(self.bins.iter()) {
            remaining_assignments_count += 1;
            remaining_item_count += bin.weight();
        }

        AssignmentResult {
            pool_assignments: self
                .assigned
                .into_iter()
                .filter(|q| !q.assigned_receivers.is_empty())
                .collect(),
            remaining_assignments_count,
            remaining_item_count,
        }
    }
}

/// 冲突配对ID = 量化人ID + 箱内容哈希
pub fn pairing_id(quantifier: &Quantifier, bin: &AssignmentBin) -> String {
    format!("{}:{:016x}", quantifier.quantifier_id, bin.content_hash())
}

// ==========================================
// AssignmentResolver - 冲突消解器
// ==========================================
pub struct AssignmentResolver {
    conflict_retry_limit: usize,
}

impl AssignmentResolver {
    pub fn new(conflict_retry_limit: usize) -> Self {
        Self {
            conflict_retry_limit,
        }
    }

    /// 执行完整消解
    pub fn resolve(&self, bins: Vec<AssignmentBin>, pool: Vec<Quantifier>) -> AssignmentResult {
        let mut state = ResolverState::new(bins, pool);
        while !state.is_finished() {
            state = self.step(state);
        }
        state.into_result()
    }

    /// 单步推进
    pub fn step(&self, mut state: ResolverState) -> ResolverState {
        let bin = match state.bins.pop_back() {
            Some(bin) => bin,
            None => return state,
        };

        let mut quantifier = match state.pool.pop() {
            Some(q) => q,
            None => {
                // 量化人耗尽，剩余箱全部放弃
                state.skipped.push(bin);
                state.skipped.extend(state.bins.drain(..).rev());
                return state;
            }
        };

        if !quantifier.conflicts_with(bin.receiver_ids()) {
            quantifier.assigned_receivers = bin.receivers;
            state.assigned.push(quantifier);
            return state;
        }

        let pairing = pairing_id(&quantifier, &bin);
        let retries = state.seen_pairings.get(&pairing).copied().unwrap_or(0);

        if retries >= self.conflict_retry_limit {
            tracing::debug!(
                quantifier_id = %quantifier.quantifier_id,
                bin_weight = bin.weight(),
                "冲突配对重试已达上限，放弃该箱"
            );
            state.skipped.push(bin);
        } else {
            state.seen_pairings.insert(pairing, retries + 1);
            state.bins.push_front(bin);
        }
        state.pool.push(quantifier);
        state
    }
}
