// ==========================================
// 赞誉量化分配系统 - 分箱引擎
// ==========================================
// 职责: 将接收人列表构造为分配箱序列
// 输入: 接收人列表 + 冗余度 K
// 输出: 扁平的分配箱序列（每个接收人恰好出现在 K 个箱中）
// ==========================================
// 两种可互换策略，输出同一 AssignmentBin 契约:
// - TargetSizePacker: 目标容量装箱
// - EvenPartitioner:  均分 + 循环平移
// ==========================================

mod even;
mod target_size;

#[cfg(test)]
mod tests;

pub use even::EvenPartitioner;
pub use target_size::TargetSizePacker;

use crate::config::AssignmentSettings;
use crate::domain::assignment::AssignmentBin;
use crate::domain::praise::Receiver;
use crate::domain::types::AssignmentMode;
use crate::engine::error::EngineResult;
use rand::RngCore;

// ==========================================
// BinConstructor - 分箱策略接口
// ==========================================
pub trait BinConstructor: Send + Sync {
    /// 构造分配箱
    ///
    /// # 保证
    /// - 每个接收人恰好出现在 K 个箱中
    /// - 同一箱内接收人不重复
    fn construct_bins(
        &self,
        receivers: &[Receiver],
        rng: &mut dyn RngCore,
    ) -> EngineResult<Vec<AssignmentBin>>;

    /// 策略名称（日志用）
    fn name(&self) -> &'static str;
}

/// 根据配置选择分箱策略
///
/// # 参数
/// - settings: 周期分配参数
/// - pool_size: 量化人池规模（均分模式需要）
pub fn constructor_for(settings: &AssignmentSettings, pool_size: usize) -> Box<dyn BinConstructor> {
    match settings.mode {
        AssignmentMode::TargetSize => Box::new(TargetSizePacker::new(
            settings.redundancy_factor,
            settings.bin_capacity(),
        )),
        AssignmentMode::Even => Box::new(EvenPartitioner::new(settings.redundancy_factor, pool_size)),
    }
}
