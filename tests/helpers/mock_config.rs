// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use praise_quant::config::{AssignmentConfigReader, AssignmentSettings, ConfigResult};
use praise_quant::domain::AssignmentMode;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub settings: AssignmentSettings,
}

impl MockConfig {
    /// 目标容量模式
    pub fn target_size(redundancy_factor: usize, praise_per_quantifier: i64) -> Self {
        Self {
            settings: AssignmentSettings {
                redundancy_factor,
                praise_per_quantifier,
                tolerance: 1.2,
                mode: AssignmentMode::TargetSize,
                max_attempts: 5,
                conflict_retry_limit: 1,
            },
        }
    }

    /// 均分模式
    pub fn even(redundancy_factor: usize) -> Self {
        let mut config = Self::target_size(redundancy_factor, 50);
        config.settings.mode = AssignmentMode::Even;
        config
    }
}

#[async_trait]
impl AssignmentConfigReader for MockConfig {
    async fn get_quantifiers_per_receiver(&self, _period_id: &str) -> ConfigResult<usize> {
        Ok(self.settings.redundancy_factor)
    }

    async fn get_praise_per_quantifier(&self, _period_id: &str) -> ConfigResult<i64> {
        Ok(self.settings.praise_per_quantifier)
    }

    async fn get_tolerance(&self, _period_id: &str) -> ConfigResult<f64> {
        Ok(self.settings.tolerance)
    }

    async fn get_assignment_mode(&self, _period_id: &str) -> ConfigResult<AssignmentMode> {
        Ok(self.settings.mode)
    }

    async fn get_max_attempts(&self, _period_id: &str) -> ConfigResult<usize> {
        Ok(self.settings.max_attempts)
    }

    async fn get_conflict_retry_limit(&self, _period_id: &str) -> ConfigResult<usize> {
        Ok(self.settings.conflict_retry_limit)
    }
}
