// ==========================================
// 分箱策略 - 均分 + 循环平移
// ==========================================
// 1. 贪心多路划分: 按条数降序，每个接收人放入当前最轻的箱，得到 N 个箱
// 2. 第 i 个最终箱 = 原箱 i, i-1, ..., i-K+1 (mod N) 的并集
// 前置条件: N >= K 且 接收人数 >= K
// ==========================================

use super::BinConstructor;
use crate::domain::assignment::AssignmentBin;
use crate::domain::praise::Receiver;
use crate::engine::error::{EngineError, EngineResult};
use rand::seq::SliceRandom;
use rand::RngCore;

pub struct EvenPartitioner {
    redundancy_factor: usize,
    pool_size: usize,
}

impl EvenPartitioner {
    pub fn new(redundancy_factor: usize, pool_size: usize) -> Self {
        Self {
            redundancy_factor,
            pool_size,
        }
    }

    fn check_preconditions(&self, receivers: &[Receiver]) -> EngineResult<()> {
        if self.pool_size < self.redundancy_factor {
            return Err(EngineError::InsufficientPool {
                pool_size: self.pool_size,
                required: self.redundancy_factor,
            });
        }
        if receivers.len() < self.redundancy_factor {
            return Err(EngineError::InsufficientReceivers {
                receivers: receivers.len(),
                required: self.redundancy_factor,
            });
        }
        Ok(())
    }

    /// 贪心划分为 N 个箱，权重相同时取下标最小者
    fn partition(&self, receivers: &[Receiver], rng: &mut dyn RngCore) -> Vec<AssignmentBin> {
        let mut ordered = receivers.to_vec();
        // 先打乱，再稳定排序，同权重接收人的次序随试算变化
        ordered.shuffle(rng);
        ordered.sort_by(|a, b| b.praise_count.cmp(&a.praise_count));

        let mut weights = vec![0i64; self.pool_size];
        let mut bins = vec![AssignmentBin::default(); self.pool_size];
        for receiver in ordered {
            let lightest = weights
                .iter()
                .enumerate()
                .min_by_key(|(idx, w)| (**w, *idx))
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            weights[lightest] += receiver.praise_count;
            bins[lightest].push(receiver);
        }
        bins
    }

    /// 循环平移合并
    fn rotate(&self, base: &[AssignmentBin]) -> Vec<AssignmentBin> {
        let n = base.len();
        (0..n)
            .map(|i| {
                let receivers = (0..self.redundancy_factor)
                    .flat_map(|shift| base[(i + n - shift % n) % n].receivers.iter().cloned())
                    .collect();
                AssignmentBin::new(receivers)
            })
            .collect()
    }
}

impl BinConstructor for EvenPartitioner {
    fn construct_bins(
        &self,
        receivers: &[Receiver],
        rng: &mut dyn RngCore,
    ) -> EngineResult<Vec<AssignmentBin>> {
        self.check_preconditions(receivers)?;

        let base = self.partition(receivers, rng);
        // 接收人少于 N 时会出现空箱，没有工作量，不参与分配
        let bins: Vec<AssignmentBin> = self
            .rotate(&base)
            .into_iter()
            .filter(|bin| !bin.is_empty())
            .collect();

        tracing::debug!(
            receivers = receivers.len(),
            pool_size = self.pool_size,
            redundancy = self.redundancy_factor,
            bins = bins.len(),
            "均分循环平移完成"
        );
        Ok(bins)
    }

    fn name(&self) -> &'static str {
        "even"
    }
}
