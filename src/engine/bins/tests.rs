use super::*;
use crate::domain::types::AssignmentMode;
use crate::engine::error::EngineError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

fn receiver(id: &str, count: usize) -> Receiver {
    Receiver::new(id, (0..count).map(|i| format!("{}-p{}", id, i)).collect())
}

fn receivers_from_counts(counts: &[usize]) -> Vec<Receiver> {
    counts
        .iter()
        .enumerate()
        .map(|(i, c)| receiver(&format!("r{}", i), *c))
        .collect()
}

/// 每个接收人出现的箱数
fn occurrences(bins: &[AssignmentBin]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for bin in bins {
        for id in bin.receiver_ids() {
            *map.entry(id.to_string()).or_insert(0) += 1;
        }
    }
    map
}

fn assert_no_duplicate_within_bin(bins: &[AssignmentBin]) {
    for bin in bins {
        let unique: HashSet<&str> = bin.receiver_ids().collect();
        assert_eq!(unique.len(), bin.len(), "箱内接收人重复");
    }
}

// ==========================================
// 目标容量装箱
// ==========================================

#[test]
fn test_target_size_each_receiver_appears_k_times() {
    let receivers = receivers_from_counts(&[5, 3, 8, 1, 2, 7, 4, 6]);
    let packer = TargetSizePacker::new(3, 10);
    let mut rng = StdRng::seed_from_u64(7);

    let bins = packer.construct_bins(&receivers, &mut rng).unwrap();

    let occ = occurrences(&bins);
    assert_eq!(occ.len(), receivers.len());
    assert!(occ.values().all(|c| *c == 3));
    assert_no_duplicate_within_bin(&bins);
    assert!(bins.iter().all(|b| b.weight() <= 10));

    let total: i64 = bins.iter().map(|b| b.weight()).sum();
    assert_eq!(total, 36 * 3);
}

#[test]
fn test_target_size_oversized_receiver_gets_own_bin() {
    let receivers = receivers_from_counts(&[25, 2, 3]);
    let packer = TargetSizePacker::new(2, 10);
    let mut rng = StdRng::seed_from_u64(1);

    let bins = packer.construct_bins(&receivers, &mut rng).unwrap();

    let oversized: Vec<&AssignmentBin> = bins.iter().filter(|b| b.weight() > 10).collect();
    assert_eq!(oversized.len(), 2);
    assert!(oversized.iter().all(|b| b.len() == 1));
    // 其余两人每轮可合并为一箱
    assert_eq!(bins.len(), 4);
}

#[test]
fn test_target_size_empty_receivers() {
    let packer = TargetSizePacker::new(3, 10);
    let mut rng = StdRng::seed_from_u64(1);
    assert!(packer.construct_bins(&[], &mut rng).unwrap().is_empty());
}

// ==========================================
// 均分 + 循环平移
// ==========================================

#[test]
fn test_even_balanced_bins() {
    let receivers = receivers_from_counts(&[5, 5, 5, 5, 5, 1, 1, 1, 1, 1]);
    let partitioner = EvenPartitioner::new(3, 5);
    let mut rng = StdRng::seed_from_u64(42);

    let bins = partitioner.construct_bins(&receivers, &mut rng).unwrap();

    assert_eq!(bins.len(), 5);
    assert!(bins.iter().all(|b| b.weight() == 18));
    assert!(occurrences(&bins).values().all(|c| *c == 3));
    assert_no_duplicate_within_bin(&bins);
}

#[test]
fn test_even_rejects_small_pool() {
    let receivers = receivers_from_counts(&[2, 2, 2]);
    let partitioner = EvenPartitioner::new(2, 1);
    let mut rng = StdRng::seed_from_u64(1);

    assert!(matches!(
        partitioner.construct_bins(&receivers, &mut rng),
        Err(EngineError::InsufficientPool {
            pool_size: 1,
            required: 2
        })
    ));
}

#[test]
fn test_even_rejects_too_few_receivers() {
    let receivers = receivers_from_counts(&[2, 2]);
    let partitioner = EvenPartitioner::new(3, 4);
    let mut rng = StdRng::seed_from_u64(1);

    assert!(matches!(
        partitioner.construct_bins(&receivers, &mut rng),
        Err(EngineError::InsufficientReceivers { .. })
    ));
}

#[test]
fn test_even_drops_empty_bins_when_pool_exceeds_receivers() {
    let receivers = receivers_from_counts(&[4, 3, 2]);
    let partitioner = EvenPartitioner::new(2, 8);
    let mut rng = StdRng::seed_from_u64(3);

    let bins = partitioner.construct_bins(&receivers, &mut rng).unwrap();

    assert!(bins.iter().all(|b| !b.is_empty()));
    assert!(occurrences(&bins).values().all(|c| *c == 2));
    assert_no_duplicate_within_bin(&bins);
}

#[test]
fn test_constructor_for_selects_strategy() {
    let mut settings = AssignmentSettings::default();
    assert_eq!(constructor_for(&settings, 10).name(), "target_size");

    settings.mode = AssignmentMode::Even;
    assert_eq!(constructor_for(&settings, 10).name(), "even");
}
