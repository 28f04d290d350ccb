// ==========================================
// 赞誉量化分配系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义分配引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::AssignmentMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CAPACITY_EPSILON: f64 = 1e-9;

// ==========================================
// AssignmentSettings - 单个周期的分配参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSettings {
    pub redundancy_factor: usize,        // K: 每个接收人需要的量化人数
    pub praise_per_quantifier: i64,      // 每个量化人的目标赞誉条数
    pub tolerance: f64,                  // 目标容量容差（如 1.2）
    pub mode: AssignmentMode,
    pub max_attempts: usize,             // 试算最大次数
    pub conflict_retry_limit: usize,     // 同一冲突配对允许重试次数
}

impl AssignmentSettings {
    /// 分箱容量上限 = 每人目标条数 × 容差（向下取整）
    pub fn bin_capacity(&self) -> i64 {
        // 吸收浮点表示误差，如 100 × 1.15 = 114.99999999999999
        (self.praise_per_quantifier as f64 * self.tolerance + CAPACITY_EPSILON).floor() as i64
    }

    /// 参数合法性校验
    pub fn validate(&self) -> ConfigResult<()> {
        if self.redundancy_factor < 1 {
            return Err(ConfigError::InvalidValue {
                key: "quantifiers_per_praise_receiver".to_string(),
                message: "必须 >= 1".to_string(),
            });
        }
        if self.praise_per_quantifier < 1 {
            return Err(ConfigError::InvalidValue {
                key: "praise_per_quantifier".to_string(),
                message: "必须 >= 1".to_string(),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "praise_per_quantifier_tolerance".to_string(),
                message: "必须 >= 1".to_string(),
            });
        }
        if self.max_attempts < 1 {
            return Err(ConfigError::InvalidValue {
                key: "assignment_max_attempts".to_string(),
                message: "必须 >= 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            redundancy_factor: 3,
            praise_per_quantifier: 50,
            tolerance: 1.2,
            mode: AssignmentMode::TargetSize,
            max_attempts: 5,
            conflict_retry_limit: 1,
        }
    }
}

// ==========================================
// AssignmentConfigReader Trait
// ==========================================
// 用途: 分配引擎所需的配置读取接口（按周期读取，周期未配置时回落到全局）
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AssignmentConfigReader: Send + Sync {
    /// 每个接收人需要的量化人数 K
    ///
    /// # 默认值
    /// - 3
    async fn get_quantifiers_per_receiver(&self, period_id: &str) -> ConfigResult<usize>;

    /// 每个量化人的目标赞誉条数
    ///
    /// # 默认值
    /// - 50
    async fn get_praise_per_quantifier(&self, period_id: &str) -> ConfigResult<i64>;

    /// 目标容量容差
    ///
    /// # 默认值
    /// - 1.2
    async fn get_tolerance(&self, period_id: &str) -> ConfigResult<f64>;

    /// 分配模式
    ///
    /// # 默认值
    /// - target_size
    async fn get_assignment_mode(&self, period_id: &str) -> ConfigResult<AssignmentMode>;

    /// 试算最大次数
    ///
    /// # 默认值
    /// - 5
    async fn get_max_attempts(&self, period_id: &str) -> ConfigResult<usize>;

    /// 同一冲突配对允许的重试次数
    ///
    /// # 默认值
    /// - 1
    async fn get_conflict_retry_limit(&self, period_id: &str) -> ConfigResult<usize>;

    /// 读取并校验整组分配参数
    async fn load_settings(&self, period_id: &str) -> ConfigResult<AssignmentSettings> {
        let settings = AssignmentSettings {
            redundancy_factor: self.get_quantifiers_per_receiver(period_id).await?,
            praise_per_quantifier: self.get_praise_per_quantifier(period_id).await?,
            tolerance: self.get_tolerance(period_id).await?,
            mode: self.get_assignment_mode(period_id).await?,
            max_attempts: self.get_max_attempts(period_id).await?,
            conflict_retry_limit: self.get_conflict_retry_limit(period_id).await?,
        };
        settings.validate()?;
        Ok(settings)
    }
}
