// ==========================================
// 分箱策略 - 目标容量装箱
// ==========================================
// 每轮: 打乱接收人 → 首次适应装箱（容量 = 目标条数 × 容差）
// 超过容量的接收人单独成箱
// 共 K 轮，每轮各自独立打乱
// ==========================================

use super::BinConstructor;
use crate::domain::assignment::AssignmentBin;
use crate::domain::praise::Receiver;
use crate::engine::error::EngineResult;
use rand::seq::SliceRandom;
use rand::RngCore;

pub struct TargetSizePacker {
    redundancy_factor: usize,
    bin_capacity: i64,
}

impl TargetSizePacker {
    pub fn new(redundancy_factor: usize, bin_capacity: i64) -> Self {
        Self {
            redundancy_factor,
            bin_capacity,
        }
    }

    /// 单轮首次适应装箱
    fn pack_round(&self, receivers: &[Receiver], rng: &mut dyn RngCore) -> Vec<AssignmentBin> {
        let mut shuffled = receivers.to_vec();
        shuffled.shuffle(rng);

        // (当前权重, 箱)
        let mut open: Vec<(i64, AssignmentBin)> = Vec::new();
        for receiver in shuffled {
            let weight = receiver.praise_count;

            if weight > self.bin_capacity {
                // 超限单独成箱，权重已超容量，后续不会再放入
                open.push((weight, AssignmentBin::new(vec![receiver])));
                continue;
            }

            match open
                .iter_mut()
                .find(|(w, _)| *w + weight <= self.bin_capacity)
            {
                Some((w, bin)) => {
                    *w += weight;
                    bin.push(receiver);
                }
                None => open.push((weight, AssignmentBin::new(vec![receiver]))),
            }
        }

        open.into_iter().map(|(_, bin)| bin).collect()
    }
}

impl BinConstructor for TargetSizePacker {
    fn construct_bins(
        &self,
        receivers: &[Receiver],
        rng: &mut dyn RngCore,
    ) -> EngineResult<Vec<AssignmentBin>> {
        let mut bins = Vec::new();
        for _ in 0..self.redundancy_factor {
            bins.extend(self.pack_round(receivers, rng));
        }

        tracing::debug!(
            receivers = receivers.len(),
            rounds = self.redundancy_factor,
            capacity = self.bin_capacity,
            bins = bins.len(),
            "目标容量装箱完成"
        );
        Ok(bins)
    }

    fn name(&self) -> &'static str {
        "target_size"
    }
}
