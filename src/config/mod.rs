// ==========================================
// 赞誉量化分配系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持周期级覆写
// 存储: config_kv 表
// ==========================================

pub mod assignment_config_trait;
pub mod config_manager;
pub mod error;

// 重导出核心配置管理器
pub use assignment_config_trait::{AssignmentConfigReader, AssignmentSettings};
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use error::{ConfigError, ConfigResult};
