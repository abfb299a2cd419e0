use crate::tasks::{
    bins::{BinPartition, Distribution},
    dataset::BlockStats,
    report,
    stats::Summary,
};
use anyhow::Result;
use log::{error, info};
use std::{collections::BTreeSet, path::Path};

/// Baseline-over-target time ratios for the keys both datasets share.
#[derive(Debug, Clone)]
pub struct SpeedupSeries {
    pub label: String,
    pub keys: Vec<u64>,
    pub ratios: Vec<f64>,
}

impl SpeedupSeries {
    /// Join `baseline` and `target` on their keys and compute
    /// `baseline / target` per key. When `subset` is given, only keys in it
    /// (and in both datasets) are kept.
    pub fn compute(
        label: &str,
        baseline: &BlockStats,
        target: &BlockStats,
        subset: Option<&BTreeSet<u64>>,
    ) -> Result<Self> {
        let candidates = match subset {
            Some(subset) => subset.clone(),
            None => baseline.keys(),
        };

        let mut keys = Vec::new();
        let mut ratios = Vec::new();
        for key in candidates {
            if let (Some(base), Some(treatment)) = (baseline.get(key), target.get(key)) {
                let ratio = base / treatment;
                if !ratio.is_finite() {
                    let reason = format!(
                        "speedup is not finite (series={label}, key={key}, baseline={base}, target={treatment})"
                    );
                    error!("{reason}");
                    anyhow::bail!(reason);
                }
                keys.push(key);
                ratios.push(ratio);
            }
        }

        if keys.is_empty() {
            let reason = format!("no overlapping keys found (series={label})");
            error!("{reason}");
            anyhow::bail!(reason);
        }
        info!("{label}: {} matching blocks", keys.len());

        Ok(Self {
            label: label.to_string(),
            keys,
            ratios,
        })
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    pub fn summary(&self) -> Result<Summary> {
        Summary::from_values(&self.ratios)
    }

    pub fn distribution(&self, bins: &BinPartition) -> Result<Distribution> {
        bins.distribute(&self.ratios)
    }
}

/// Compare two arbitrary block-stats files on the given columns, print the
/// summary and bin tables, and return the series.
pub fn compare_files(
    baseline: &Path,
    target: &Path,
    key_column: &str,
    value_column: &str,
    bins: &BinPartition,
) -> Result<SpeedupSeries> {
    let baseline_stats = BlockStats::from_path_with_columns(baseline, key_column, value_column)?;
    let target_stats = BlockStats::from_path_with_columns(target, key_column, value_column)?;

    let label = format!(
        "{} vs {}",
        baseline.file_stem().unwrap_or_default().to_string_lossy(),
        target.file_stem().unwrap_or_default().to_string_lossy()
    );
    let series = SpeedupSeries::compute(&label, &baseline_stats, &target_stats, None)?;
    report::print_summary(&label, &series.summary()?);
    report::print_distribution(bins, &series.distribution(bins)?);

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(rows: &[(u64, f64)]) -> BlockStats {
        rows.iter().copied().collect()
    }

    #[test]
    fn test_ratio_is_baseline_over_target() {
        let seq = stats(&[(1, 10.0), (2, 8.0), (3, 6.0)]);
        let deter = stats(&[(2, 2.0), (3, 12.0), (4, 1.0)]);

        let series = SpeedupSeries::compute("deter", &seq, &deter, None).unwrap();

        assert_eq!(series.keys, vec![2, 3]);
        assert_eq!(series.ratios, vec![4.0, 0.5]);
    }

    #[test]
    fn test_subset_restricts_keys() {
        let seq = stats(&[(1, 10.0), (2, 8.0), (3, 6.0)]);
        let optim = stats(&[(1, 5.0), (2, 2.0), (3, 3.0)]);
        let subset: BTreeSet<u64> = [1, 3, 99].into_iter().collect();

        let series = SpeedupSeries::compute("optim", &seq, &optim, Some(&subset)).unwrap();

        assert_eq!(series.keys, vec![1, 3]);
        assert_eq!(series.ratios, vec![2.0, 2.0]);
    }

    #[test]
    fn test_empty_intersection_fails() {
        let seq = stats(&[(1, 10.0)]);
        let optim = stats(&[(2, 5.0)]);

        let err = SpeedupSeries::compute("optim", &seq, &optim, None).unwrap_err();
        assert!(err.to_string().contains("series=optim"));

        let empty = BTreeSet::new();
        assert!(SpeedupSeries::compute("seq", &seq, &seq, Some(&empty)).is_err());
    }

    #[test]
    fn test_overflowing_ratio_fails() {
        let seq = stats(&[(1, 2.0), (7, 1e300)]);
        let optim = stats(&[(1, 1.0), (7, 1e-10)]);

        let err = SpeedupSeries::compute("optim", &seq, &optim, None).unwrap_err();
        assert!(err.to_string().contains("key=7"));
        assert!(err.to_string().contains("series=optim"));
    }
}
