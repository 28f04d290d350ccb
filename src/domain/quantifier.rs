// ==========================================
// 赞誉量化分配系统 - 量化人领域模型
// ==========================================

use crate::domain::praise::Receiver;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// Quantifier - 量化人
// ==========================================
// conflict_ids: 该量化人自己关联的账号，不能量化发给这些账号的赞誉
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantifier {
    pub quantifier_id: String,
    pub conflict_ids: HashSet<String>,
    pub assigned_receivers: Vec<Receiver>,
}

impl Quantifier {
    pub fn new(quantifier_id: impl Into<String>, conflict_ids: HashSet<String>) -> Self {
        Self {
            quantifier_id: quantifier_id.into(),
            conflict_ids,
            assigned_receivers: Vec::new(),
        }
    }

    /// 判断是否与给定接收人存在利益冲突
    pub fn conflicts_with<'a, I>(&self, receiver_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        receiver_ids
            .into_iter()
            .any(|id| self.conflict_ids.contains(id))
    }

    /// 已分配的赞誉条数
    pub fn assigned_praise_count(&self) -> i64 {
        self.assigned_receivers.iter().map(|r| r.praise_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_with() {
        let q = Quantifier::new("u1", HashSet::from(["acc-1".to_string()]));
        assert!(q.conflicts_with(["acc-2", "acc-1"]));
        assert!(!q.conflicts_with(["acc-2"]));
    }
}
