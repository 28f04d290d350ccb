// ==========================================
// 赞誉量化分配系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行/上层服务调用
// ==========================================

pub mod assignment_api;
pub mod error;

// 重导出核心类型
pub use assignment_api::AssignmentApi;
pub use error::{ApiError, ApiResult};
