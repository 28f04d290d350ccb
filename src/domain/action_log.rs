// ==========================================
// 赞誉量化分配系统 - 操作日志领域模型
// ==========================================
// 红线: 分配提交、重试耗尽、量化人替换、周期关闭必须记录
// 用途: 审计追踪（只追加）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,             // 日志ID
    pub period_id: Option<String>,     // 关联周期
    pub action_type: String,           // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,      // 操作时间戳
    pub actor: String,                 // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数/结果 (JSON)
    pub detail: Option<String>,        // 人类可读描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    AssignQuantifiers, // 提交量化人分配
    AssignmentDeficit, // 试算重试耗尽（量化人不足）
    ReplaceQuantifier, // 替换量化人
    ClosePeriod,       // 关闭周期
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::AssignQuantifiers => "AssignQuantifiers",
            ActionType::AssignmentDeficit => "AssignmentDeficit",
            ActionType::ReplaceQuantifier => "ReplaceQuantifier",
            ActionType::ClosePeriod => "ClosePeriod",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AssignQuantifiers" => Some(ActionType::AssignQuantifiers),
            "AssignmentDeficit" => Some(ActionType::AssignmentDeficit),
            "ReplaceQuantifier" => Some(ActionType::ReplaceQuantifier),
            "ClosePeriod" => Some(ActionType::ClosePeriod),
            _ => None,
        }
    }
}

impl ActionLog {
    /// 创建新的操作日志（action_id 自动生成）
    pub fn new(period_id: Option<String>, action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            period_id,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置描述
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn action_type(&self) -> Option<ActionType> {
        ActionType::from_str(&self.action_type)
    }
}
