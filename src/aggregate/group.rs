//! Order-preserving group-by over price records.

use std::collections::HashMap;
use std::hash::Hash;

use crate::domain::PriceRecord;

/// Running mean that skips missing values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when no value was pushed.
    pub fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Group `records` by `key`, folding each record into its group's accumulator.
///
/// Groups come back in first-encounter order. Records for which `key`
/// returns `None` are skipped.
pub fn group_by<'a, K, A, KF, F>(records: &'a [PriceRecord], key: KF, mut fold: F) -> Vec<(K, A)>
where
    K: Eq + Hash + Clone,
    A: Default,
    KF: Fn(&'a PriceRecord) -> Option<K>,
    F: FnMut(&mut A, &'a PriceRecord),
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, A)> = Vec::new();

    for record in records {
        let Some(k) = key(record) else { continue };
        let slot = match index.get(&k) {
            Some(&i) => i,
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, A::default()));
                groups.len() - 1
            }
        };
        fold(&mut groups[slot].1, record);
    }

    groups
}

/// Group by `key` and average `value`, dropping groups with no values.
pub fn group_mean<'a, K, KF, VF>(records: &'a [PriceRecord], key: KF, value: VF) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    KF: Fn(&'a PriceRecord) -> Option<K>,
    VF: Fn(&'a PriceRecord) -> Option<f64>,
{
    group_by(records, key, |acc: &mut Mean, r| acc.push(value(r)))
        .into_iter()
        .filter_map(|(k, acc)| acc.value().map(|v| (k, v)))
        .collect()
}

/// Bit pattern of a coordinate for use in a hash key (`-0.0` folds into `0.0`).
pub fn coord_bits(v: f64) -> u64 {
    (v + 0.0).to_bits()
}
