// ==========================================
// 赞誉量化分配系统 - 量化周期领域模型
// ==========================================
// 职责: 周期实体、周期日期窗口、周期汇总
// ==========================================

use crate::domain::types::PeriodStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Period - 量化周期
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub period_id: String,         // 周期ID
    pub name: String,              // 周期名称
    pub status: PeriodStatus,      // 周期状态
    pub end_date: NaiveDate,       // 周期结束日（含）
    pub created_at: NaiveDateTime, // 创建时间
}

impl Period {
    pub fn is_open(&self) -> bool {
        self.status == PeriodStatus::Open
    }

    pub fn is_quantify(&self) -> bool {
        self.status == PeriodStatus::Quantify
    }
}

// ==========================================
// PeriodWindow - 周期日期窗口
// ==========================================
// 区间: (上一周期结束日, 本周期结束日]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start_exclusive: Option<NaiveDate>, // 上一周期结束日（不含），首个周期为 None
    pub end_inclusive: NaiveDate,           // 本周期结束日（含）
}

impl PeriodWindow {
    pub fn new(start_exclusive: Option<NaiveDate>, end_inclusive: NaiveDate) -> Self {
        Self {
            start_exclusive,
            end_inclusive,
        }
    }

    /// 判断日期是否落在窗口内
    pub fn contains(&self, date: NaiveDate) -> bool {
        let after_start = self.start_exclusive.map_or(true, |start| date > start);
        after_start && date <= self.end_inclusive
    }
}

// ==========================================
// PeriodDetails - 周期汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDetails {
    pub period: Period,
    pub window: PeriodWindow,
    pub receivers: Vec<ReceiverSummary>,
    pub quantifiers: Vec<QuantifierSummary>,
}

/// 接收人汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverSummary {
    pub receiver_id: String,
    pub praise_count: i64,
    pub score_total: f64,
}

/// 量化人进度汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantifierSummary {
    pub quantifier_id: String,
    pub praise_count: i64,   // 已分配的量化记录数
    pub finished_count: i64, // 已完成的量化记录数
}
