// ==========================================
// 赞誉量化分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod assignment;
pub mod period;
pub mod praise;
pub mod quantifier;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use assignment::{AssignmentBin, AssignmentResult, PoolSizeReport};
pub use period::{Period, PeriodDetails, PeriodWindow, QuantifierSummary, ReceiverSummary};
pub use praise::{Praise, Quantification, Receiver};
pub use quantifier::Quantifier;
pub use types::{AssignmentMode, PeriodStatus};
