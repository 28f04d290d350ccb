// ==========================================
// 赞誉量化分配系统 - 操作日志数据仓储
// ==========================================
// 依据: action_log 表（只追加）
// 红线: 分配/替换/关闭等写入必须记录
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::ActionLogRepository;
