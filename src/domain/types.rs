// ==========================================
// 赞誉量化分配系统 - 领域类型定义
// ==========================================
// 职责: 周期状态、分配模式等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 周期状态 (Period Status)
// ==========================================
// 状态机: OPEN → QUANTIFY → CLOSED (终态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    Open,     // 收集赞誉中
    Quantify, // 量化中（已分配）
    Closed,   // 已关闭
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PeriodStatus {
    /// 从字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Some(PeriodStatus::Open),
            "QUANTIFY" => Some(PeriodStatus::Quantify),
            "CLOSED" => Some(PeriodStatus::Closed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PeriodStatus::Open => "OPEN",
            PeriodStatus::Quantify => "QUANTIFY",
            PeriodStatus::Closed => "CLOSED",
        }
    }

    /// 是否允许迁移到目标状态
    pub fn can_transition_to(&self, to: PeriodStatus) -> bool {
        matches!(
            (self, to),
            (PeriodStatus::Open, PeriodStatus::Quantify)
                | (PeriodStatus::Quantify, PeriodStatus::Closed)
        )
    }
}

// ==========================================
// 分配模式 (Assignment Mode)
// ==========================================
// target_size: 目标容量装箱（每轮随机 + 首次适应）
// even: 均分（贪心多路划分 + 循环平移）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    TargetSize,
    Even,
}

impl Default for AssignmentMode {
    fn default() -> Self {
        AssignmentMode::TargetSize
    }
}

impl AssignmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentMode::TargetSize => "target_size",
            AssignmentMode::Even => "even",
        }
    }
}

impl fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssignmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "target_size" | "target-size" => Ok(AssignmentMode::TargetSize),
            "even" => Ok(AssignmentMode::Even),
            other => Err(format!("未知分配模式: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_status_transitions() {
        assert!(PeriodStatus::Open.can_transition_to(PeriodStatus::Quantify));
        assert!(PeriodStatus::Quantify.can_transition_to(PeriodStatus::Closed));
        assert!(!PeriodStatus::Open.can_transition_to(PeriodStatus::Closed));
        assert!(!PeriodStatus::Closed.can_transition_to(PeriodStatus::Open));
        assert!(!PeriodStatus::Quantify.can_transition_to(PeriodStatus::Quantify));
    }

    #[test]
    fn test_period_status_db_str() {
        for status in [PeriodStatus::Open, PeriodStatus::Quantify, PeriodStatus::Closed] {
            assert_eq!(PeriodStatus::from_db_str(status.to_db_str()), Some(status));
        }
        assert_eq!(PeriodStatus::from_db_str("quantify"), Some(PeriodStatus::Quantify));
        assert_eq!(PeriodStatus::from_db_str("UNKNOWN"), None);
    }

    #[test]
    fn test_assignment_mode_parse() {
        assert_eq!("even".parse::<AssignmentMode>().unwrap(), AssignmentMode::Even);
        assert_eq!(
            "Target-Size".parse::<AssignmentMode>().unwrap(),
            AssignmentMode::TargetSize
        );
        assert!("random".parse::<AssignmentMode>().is_err());
        assert_eq!(AssignmentMode::default(), AssignmentMode::TargetSize);
    }
}
