use anyhow::Result;
use clap::ValueEnum;
use log::error;

/// Named partitions selectable from the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BinSet {
    /// Eight bins from <1× to ≥20×
    #[default]
    Coarse,
    /// One bin per integer speedup up to 50×
    Fine,
}

impl BinSet {
    pub fn partition(&self) -> BinPartition {
        match self {
            BinSet::Coarse => BinPartition::coarse(),
            BinSet::Fine => BinPartition::fine(),
        }
    }
}

/// A partition of `[0, inf)` into half-open bins `[edges[i], edges[i + 1])`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinPartition {
    edges: Vec<f64>,
    labels: Vec<String>,
}

/// Per-bin counts and their share of the total, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub counts: Vec<usize>,
    pub percentages: Vec<f64>,
    pub total: usize,
}

impl BinPartition {
    pub fn new(edges: Vec<f64>, labels: Vec<String>) -> Result<Self> {
        if edges.len() < 2 {
            anyhow::bail!("a partition needs at least two edges (edges={edges:?})");
        }
        if edges[0] != 0.0 {
            anyhow::bail!("first edge must be 0 (edges={edges:?})");
        }
        if edges[edges.len() - 1] != f64::INFINITY {
            anyhow::bail!("last edge must be +inf (edges={edges:?})");
        }
        if let Some(pair) = edges.windows(2).find(|w| w[0].is_nan() || w[0] >= w[1]) {
            anyhow::bail!(
                "edges must be strictly increasing (edges={edges:?}, offending={pair:?})"
            );
        }
        if labels.len() != edges.len() - 1 {
            anyhow::bail!(
                "expected one label per bin (bins={}, labels={})",
                edges.len() - 1,
                labels.len()
            );
        }

        Ok(Self { edges, labels })
    }

    /// `<1×, 1-2×, 2-3×, 3-4×, 4-5×, 5-10×, 10-20×, ≥20×`
    pub fn coarse() -> Self {
        Self {
            edges: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 20.0, f64::INFINITY],
            labels: ["<1×", "1-2×", "2-3×", "3-4×", "4-5×", "5-10×", "10-20×", "≥20×"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Unit-width bins up to 50×, then a single open-ended bin.
    pub fn fine() -> Self {
        let mut edges: Vec<f64> = (0..=50).map(f64::from).collect();
        edges.push(f64::INFINITY);

        let mut labels = vec!["<1×".to_string()];
        labels.extend((1..50).map(|i| format!("{i}×")));
        labels.push("≥50×".to_string());

        Self { edges, labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value < 0.0 {
            return None;
        }

        // Number of edges <= value; the first edge is 0 so this is >= 1.
        let upper = self.edges.partition_point(|edge| *edge <= value);
        if upper >= self.edges.len() {
            // Only +inf itself reaches past the last edge.
            return None;
        }

        Some(upper - 1)
    }

    pub fn distribute(&self, values: &[f64]) -> Result<Distribution> {
        if values.is_empty() {
            error!("cannot bin an empty set of values");
            anyhow::bail!("cannot bin an empty set of values");
        }

        let mut counts = vec![0usize; self.len()];
        for value in values {
            match self.bin_index(*value) {
                Some(idx) => counts[idx] += 1,
                None => {
                    let reason = format!("value outside the partition (value={value})");
                    error!("{reason}");
                    anyhow::bail!(reason);
                }
            }
        }

        let total = values.len();
        let percentages = counts
            .iter()
            .map(|count| *count as f64 / total as f64 * 100.0)
            .collect();

        Ok(Distribution {
            counts,
            percentages,
            total,
        })
    }
}

impl Distribution {
    pub fn max_percentage(&self) -> f64 {
        self.percentages.iter().copied().fold(0.0, f64::max)
    }
}
