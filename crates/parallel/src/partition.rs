//! Partitioner: contiguous, near-equal slices of a feature collection
//!
//! `N` features over `W` workers give `W` partitions of `N / W` features,
//! with the whole remainder `N % W` folded into the first partition:
//! sizes are `base + rem, base, base, ...`. No feature is lost to
//! rounding and the split depends only on `N` and `W`.

use crate::strategy::num_cpus;
use ivmsmooth_core::{Error, FeatureCollection, Result};
use std::ops::Range;

/// A contiguous slice of the input, owned by one worker
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Position of this partition in the plan
    pub index: usize,
    /// Index range of the features in the source collection
    pub range: Range<usize>,
    /// Private copy of the features in `range`
    pub features: FeatureCollection,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Worker count for this host: available cores minus one for the
/// orchestrating thread, at least 1
pub fn default_worker_count() -> usize {
    num_cpus().saturating_sub(1).max(1)
}

/// Partition sizes for `total` features over `workers` workers
pub fn partition_sizes(total: usize, workers: usize) -> Result<Vec<usize>> {
    if workers == 0 {
        return Err(Error::InvalidParameter {
            name: "workers",
            value: "0".into(),
            reason: "at least one worker is required".into(),
        });
    }

    let base = total / workers;
    let remainder = total % workers;
    let mut sizes = vec![base; workers];
    sizes[0] += remainder;
    Ok(sizes)
}

/// Index ranges of each partition, in order
pub fn partition_ranges(total: usize, workers: usize) -> Result<Vec<Range<usize>>> {
    let mut start = 0;
    Ok(partition_sizes(total, workers)?
        .into_iter()
        .map(|size| {
            let range = start..start + size;
            start += size;
            range
        })
        .collect())
}

/// Split `features` into `workers` partitions, each with its own copy
pub fn partition(features: &FeatureCollection, workers: usize) -> Result<Vec<Partition>> {
    Ok(partition_ranges(features.len(), workers)?
        .into_iter()
        .enumerate()
        .map(|(index, range)| Partition {
            index,
            features: features.features[range.clone()].iter().cloned().collect(),
            range,
        })
        .collect())
}
