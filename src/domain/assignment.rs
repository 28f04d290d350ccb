// ==========================================
// 赞誉量化分配系统 - 分配结果领域模型
// ==========================================
// 职责: 分配箱、分配结果、量化人池规模报告
// ==========================================

use crate::domain::praise::Receiver;
use crate::domain::quantifier::Quantifier;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

// ==========================================
// AssignmentBin - 分配箱
// ==========================================
// 整体分给一个量化人，解析过程中不拆分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentBin {
    pub receivers: Vec<Receiver>,
}

impl AssignmentBin {
    pub fn new(receivers: Vec<Receiver>) -> Self {
        Self { receivers }
    }

    /// 箱内赞誉总数（权重）
    pub fn weight(&self) -> i64 {
        self.receivers.iter().map(|r| r.praise_count).sum()
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    pub fn push(&mut self, receiver: Receiver) {
        self.receivers.push(receiver);
    }

    pub fn receiver_ids(&self) -> impl Iterator<Item = &str> {
        self.receivers.iter().map(|r| r.receiver_id.as_str())
    }

    /// 箱内容哈希（按接收人ID顺序）
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for id in self.receiver_ids() {
            id.hash(&mut hasher);
        }
        hasher.finish()
    }
}

// ==========================================
// AssignmentResult - 分配结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub pool_assignments: Vec<Quantifier>, // 仅包含已分配到接收人的量化人
    pub remaining_assignments_count: usize, // 未能分配的箱数
    pub remaining_item_count: i64,          // 未能分配的赞誉条数
}

impl AssignmentResult {
    /// 已分配的赞誉条数（含冗余）
    pub fn assigned_item_count(&self) -> i64 {
        self.pool_assignments
            .iter()
            .map(|q| q.assigned_praise_count())
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_assignments_count == 0
    }

    /// 某接收人被分配给了多少个不同的量化人
    pub fn coverage_of(&self, receiver_id: &str) -> usize {
        self.pool_assignments
            .iter()
            .filter(|q| {
                q.assigned_receivers
                    .iter()
                    .any(|r| r.receiver_id == receiver_id)
            })
            .count()
    }
}

// ==========================================
// PoolSizeReport - 量化人池规模报告
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSizeReport {
    pub pool_size: usize,
    pub pool_size_needed: usize,
    pub pool_deficit: usize,
}
