// ==========================================
// 赞誉量化分配系统 - 赞誉/量化记录领域模型
// ==========================================
// 职责: 赞誉条目、按接收人聚合的 Receiver、量化记录
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Praise - 赞誉条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Praise {
    pub praise_id: String,   // 赞誉ID
    pub receiver_id: String, // 接收人账号ID
    pub giver_id: String,    // 给予人账号ID
    pub reason: String,      // 赞誉理由
    pub praise_date: NaiveDate,
    pub score: f64,          // 对外可见得分（未量化时为 0）
}

// ==========================================
// Receiver - 接收人（分配单元）
// ==========================================
// 每次试算重新构建，不在原处修改
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Receiver {
    pub receiver_id: String,
    pub praise_count: i64,
    pub praise_ids: Vec<String>,
}

impl Receiver {
    pub fn new(receiver_id: impl Into<String>, praise_ids: Vec<String>) -> Self {
        Self {
            receiver_id: receiver_id.into(),
            praise_count: praise_ids.len() as i64,
            praise_ids,
        }
    }
}

// ==========================================
// Quantification - 量化记录
// ==========================================
// 每个 (赞誉, 量化人) 一条，分配提交时创建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantification {
    pub quantification_id: String,
    pub praise_id: String,
    pub quantifier_id: String,
    pub score: f64,                          // 0 = 未评分
    pub dismissed: bool,
    pub duplicate_praise_id: Option<String>, // 标记为重复时指向原赞誉
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Quantification {
    /// 新建中性量化记录
    pub fn neutral(praise_id: &str, quantifier_id: &str, now: NaiveDateTime) -> Self {
        Self {
            quantification_id: uuid::Uuid::new_v4().to_string(),
            praise_id: praise_id.to_string(),
            quantifier_id: quantifier_id.to_string(),
            score: 0.0,
            dismissed: false,
            duplicate_praise_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否已完成量化
    pub fn is_finished(&self) -> bool {
        self.score > 0.0 || self.dismissed || self.duplicate_praise_id.is_some()
    }
}
