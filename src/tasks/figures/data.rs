//! Fixed datasets behind the figures that are not computed from per-block
//! statistics. Each one defaults to the published measurements and can be
//! replaced by a YAML file in the figure's data directory.

use crate::tasks::figures::{canvas::Hatch, color::get_color_from_label};
use anyhow::Result;
use log::{error, info};
use serde::{Deserialize, de::DeserializeOwned};
use std::{fs, path::Path};

/// Common validation for YAML-overridable datasets.
pub trait FigureData: DeserializeOwned + Default {
    fn validate(&self) -> Result<()>;
}

/// Load `path` if it exists, otherwise fall back to the built-in data.
pub fn load_or_default<T: FigureData>(path: &Path) -> Result<T> {
    let data = if path.exists() {
        let contents = fs::read_to_string(path).map_err(|e| {
            let reason = format!("error reading file (path={}, error={e:?})", path.display());
            error!("{reason}");
            anyhow::anyhow!(reason)
        })?;
        info!("loading figure data from {}", path.display());
        parse_yaml(&contents)?
    } else {
        info!(
            "no figure data at {}, using built-in measurements",
            path.display()
        );
        let data = T::default();
        data.validate()?;
        data
    };

    Ok(data)
}

pub fn parse_yaml<T: FigureData>(contents: &str) -> Result<T> {
    let data: T = serde_yaml::from_str(contents).map_err(|e| {
        let reason = format!("error parsing figure data (error={e})");
        error!("{reason}");
        anyhow::anyhow!(reason)
    })?;
    data.validate()?;

    Ok(data)
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        anyhow::bail!("length mismatch (field={what}, expected={expected}, actual={actual})");
    }

    Ok(())
}

fn check_positive(what: &str, values: &[f64]) -> Result<()> {
    if let Some(value) = values.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        anyhow::bail!("values must be positive (field={what}, value={value})");
    }

    Ok(())
}

fn check_non_negative(what: &str, values: &[f64]) -> Result<()> {
    if let Some(value) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        anyhow::bail!("values must be non-negative (field={what}, value={value})");
    }

    Ok(())
}

// -------------------------------------------------------------------------
// Micro-benchmark
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SystemTimes {
    pub name: String,
    pub color: String,
    /// One absolute time per benchmark.
    pub times: Vec<f64>,
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub hatch: Hatch,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MicroBenchmarkData {
    pub unit: String,
    /// Name of the system every other one is compared against.
    pub baseline: String,
    pub benchmarks: Vec<String>,
    pub systems: Vec<SystemTimes>,
    #[serde(default)]
    pub y_max: Option<f64>,
}

impl Default for MicroBenchmarkData {
    fn default() -> Self {
        let system = |name: &str, color: &str, times: [f64; 3], highlight| SystemTimes {
            name: name.to_string(),
            color: color.to_string(),
            times: times.to_vec(),
            highlight,
            hatch: Hatch::None,
        };

        Self {
            unit: "µs".to_string(),
            baseline: "Revm Native".to_string(),
            benchmarks: vec![
                "ERC20-\nTransfer".to_string(),
                "Uniswap-Swap\n1-hop".to_string(),
                "Uniswap-Swap\n4-hop".to_string(),
            ],
            systems: vec![
                system("Revm Native", "gray", [4.9406, 62.021, 172.49], false),
                system("Forerunner-Revm", "light-blue", [4.5099, 39.199, 130.36], false),
                // Proportionally scaled to the Revm Native machine.
                SystemTimes {
                    hatch: Hatch::Diagonal,
                    ..system("Revmc", "peach", [5.55, 42.35, 126.84], false)
                },
                system("Helios", "helios", [4.3465, 30.963, 97.345], true),
            ],
            y_max: Some(2.4),
        }
    }
}

impl FigureData for MicroBenchmarkData {
    fn validate(&self) -> Result<()> {
        for system in &self.systems {
            check_len(
                &format!("{}.times", system.name),
                self.benchmarks.len(),
                system.times.len(),
            )?;
            check_positive(&format!("{}.times", system.name), &system.times)?;
            get_color_from_label(&system.color)?;
        }
        self.baseline_times()?;

        Ok(())
    }
}

impl MicroBenchmarkData {
    fn baseline_times(&self) -> Result<&[f64]> {
        self.systems
            .iter()
            .find(|system| system.name == self.baseline)
            .map(|system| system.times.as_slice())
            .ok_or_else(|| anyhow::anyhow!("baseline system not found (baseline={})", self.baseline))
    }

    /// Speedup of every system over the baseline, per benchmark.
    pub fn speedups(&self) -> Result<Vec<(String, Vec<f64>)>> {
        let baseline = self.baseline_times()?;

        Ok(self
            .systems
            .iter()
            .map(|system| {
                let speedups = baseline
                    .iter()
                    .zip(&system.times)
                    .map(|(base, time)| base / time)
                    .collect();
                (system.name.clone(), speedups)
            })
            .collect())
    }
}

// -------------------------------------------------------------------------
// Overhead breakdown
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LatencyComponent {
    pub name: String,
    pub color: String,
    /// One value per configuration.
    pub values: Vec<f64>,
    /// Optional note per configuration, drawn inside the segment.
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub hatch: Hatch,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OverheadBreakdownData {
    pub unit: String,
    pub configurations: Vec<String>,
    /// Stacked bottom to top.
    pub components: Vec<LatencyComponent>,
    #[serde(default)]
    pub y_max: Option<f64>,
}

impl Default for OverheadBreakdownData {
    fn default() -> Self {
        Self {
            unit: "ns".to_string(),
            configurations: vec!["Native EVM".to_string(), "Helios (SSA)".to_string()],
            components: vec![
                LatencyComponent {
                    name: "Heavy Ops (Keccak)".to_string(),
                    color: "helios".to_string(),
                    values: vec![314.79, 312.33],
                    notes: vec![],
                    hatch: Hatch::None,
                },
                LatencyComponent {
                    name: "Light Ops".to_string(),
                    color: "amber".to_string(),
                    values: vec![46.49, 45.96],
                    notes: vec![],
                    hatch: Hatch::Diagonal,
                },
                // Native: stack (12 * 5.27) + gas check (13 * 5.47).
                // Helios: node (7 * 5.14) + input (7 * 4.83) + reg (4 * 3.97)
                // + chunk (2 * 3.99).
                LatencyComponent {
                    name: "System Overhead".to_string(),
                    color: "pale-blue".to_string(),
                    values: vec![134.35, 93.65],
                    notes: vec!["(Stack/Gas)".to_string(), "(Graph/Reg/Gas)".to_string()],
                    hatch: Hatch::None,
                },
            ],
            y_max: Some(620.0),
        }
    }
}

impl FigureData for OverheadBreakdownData {
    fn validate(&self) -> Result<()> {
        if self.components.is_empty() {
            anyhow::bail!("overhead breakdown needs at least one component");
        }
        for component in &self.components {
            check_len(
                &format!("{}.values", component.name),
                self.configurations.len(),
                component.values.len(),
            )?;
            if !component.notes.is_empty() {
                check_len(
                    &format!("{}.notes", component.name),
                    self.configurations.len(),
                    component.notes.len(),
                )?;
            }
            check_non_negative(&format!("{}.values", component.name), &component.values)?;
            get_color_from_label(&component.color)?;
        }

        Ok(())
    }
}

impl OverheadBreakdownData {
    pub fn totals(&self) -> Vec<f64> {
        (0..self.configurations.len())
            .map(|idx| self.components.iter().map(|c| c.values[idx]).sum())
            .collect()
    }
}

// -------------------------------------------------------------------------
// Node count distribution
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NodeCountData {
    /// Number of graphs the percentages were measured over.
    pub total_graphs: u64,
    pub ranges: Vec<String>,
    pub percentages: Vec<f64>,
    /// Bars at or above this percentage get a value label.
    pub label_threshold: f64,
    #[serde(default)]
    pub y_max: Option<f64>,
}

impl Default for NodeCountData {
    fn default() -> Self {
        Self {
            total_graphs: 134_601,
            ranges: [
                "0-10", "11-20", "21-50", "51-100", "101-200", "201-500", "501-1K", "1K-2K",
                "2K-5K", "5K-10K", "10K+",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            percentages: vec![
                0.89, 1.07, 9.23, 10.55, 9.18, 30.81, 7.98, 26.31, 2.70, 0.75, 0.53,
            ],
            label_threshold: 7.0,
            y_max: Some(36.0),
        }
    }
}

impl FigureData for NodeCountData {
    fn validate(&self) -> Result<()> {
        check_len("percentages", self.ranges.len(), self.percentages.len())?;
        if let Some(pct) = self
            .percentages
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 100.0)
        {
            anyhow::bail!("percentage out of range (value={pct})");
        }

        Ok(())
    }
}

// -------------------------------------------------------------------------
// Parallel instruction execution
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParallelWorkload {
    pub name: String,
    /// Sequential native execution time.
    pub native: f64,
    /// Parallel execution time.
    pub parallel: f64,
    /// Critical path length ratio.
    pub cplr: f64,
}

impl ParallelWorkload {
    pub fn slowdown(&self) -> f64 {
        self.parallel / self.native
    }

    pub fn theoretical_speedup(&self) -> f64 {
        if self.cplr > 0.0 { 1.0 / self.cplr } else { 1.0 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParallelInstructionData {
    pub title: String,
    pub workloads: Vec<ParallelWorkload>,
}

impl Default for ParallelInstructionData {
    fn default() -> Self {
        let workload = |name: &str, native, parallel, cplr| ParallelWorkload {
            name: name.to_string(),
            native,
            parallel,
            cplr,
        };

        Self {
            title: "8-Thread Parallelism Severely Underperforms Revm Native".to_string(),
            workloads: vec![
                workload("ERC20\nTransfer", 4.9406, 41.51, 0.122222),
                workload("Uniswap V2\n1-hop Swap", 62.021, 417.69, 0.090978),
                workload("Uniswap V2\n4-hop Swap", 172.49, 1031.9, 0.037736),
            ],
        }
    }
}

impl FigureData for ParallelInstructionData {
    fn validate(&self) -> Result<()> {
        if self.workloads.is_empty() {
            anyhow::bail!("parallel instruction data needs at least one workload");
        }
        for workload in &self.workloads {
            check_positive(&workload.name, &[workload.native, workload.parallel])?;
        }

        Ok(())
    }
}

// -------------------------------------------------------------------------
// Storage overhead
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageOverheadData {
    pub block_counts: Vec<u64>,
    pub block_sizes_mb: Vec<f64>,
    pub artifacts_mb: Vec<f64>,
}

impl Default for StorageOverheadData {
    fn default() -> Self {
        Self {
            block_counts: vec![1000, 2000, 3000, 4000, 5000],
            block_sizes_mb: vec![227.93, 421.85, 626.38, 812.41, 1015.72],
            artifacts_mb: vec![119.0, 188.0, 301.0, 362.0, 426.0],
        }
    }
}

impl FigureData for StorageOverheadData {
    fn validate(&self) -> Result<()> {
        if self.block_counts.is_empty() {
            anyhow::bail!("storage data needs at least one row");
        }
        check_len("block_sizes_mb", self.block_counts.len(), self.block_sizes_mb.len())?;
        check_len("artifacts_mb", self.block_counts.len(), self.artifacts_mb.len())?;
        check_positive("block_sizes_mb", &self.block_sizes_mb)?;
        check_non_negative("artifacts_mb", &self.artifacts_mb)?;
        if self.block_counts.contains(&0) {
            anyhow::bail!("block counts must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        MicroBenchmarkData::default().validate().unwrap();
        OverheadBreakdownData::default().validate().unwrap();
        NodeCountData::default().validate().unwrap();
        ParallelInstructionData::default().validate().unwrap();
        StorageOverheadData::default().validate().unwrap();
    }

    #[test]
    fn test_micro_benchmark_speedups() {
        let speedups = MicroBenchmarkData::default().speedups().unwrap();

        assert_eq!(speedups.len(), 4);
        assert_eq!(speedups[0].0, "Revm Native");
        assert!(speedups[0].1.iter().all(|s| (*s - 1.0).abs() < 1e-12));

        let helios = &speedups[3].1;
        assert!((helios[0] - 4.9406 / 4.3465).abs() < 1e-12);
        assert!(helios[2] > 1.7);
    }

    #[test]
    fn test_overhead_totals() {
        let totals = OverheadBreakdownData::default().totals();
        assert!((totals[0] - 495.63).abs() < 1e-9);
        assert!((totals[1] - 451.94).abs() < 1e-9);
    }

    #[test]
    fn test_theoretical_speedup() {
        let data = ParallelInstructionData::default();
        assert!((data.workloads[0].theoretical_speedup() - 1.0 / 0.122222).abs() < 1e-9);

        let serial = ParallelWorkload {
            name: "serial".to_string(),
            native: 1.0,
            parallel: 2.0,
            cplr: 0.0,
        };
        assert_eq!(serial.theoretical_speedup(), 1.0);
        assert_eq!(serial.slowdown(), 2.0);
    }

    #[test]
    fn test_yaml_override() {
        let data: StorageOverheadData = parse_yaml(
            "block_counts: [10, 20]\nblock_sizes_mb: [1.0, 2.0]\nartifacts_mb: [0.5, 0.5]\n",
        )
        .unwrap();
        assert_eq!(data.block_counts, vec![10, 20]);
    }

    #[test]
    fn test_yaml_validation() {
        let err = parse_yaml::<StorageOverheadData>(
            "block_counts: [10, 20]\nblock_sizes_mb: [1.0]\nartifacts_mb: [0.5, 0.5]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("block_sizes_mb"));

        let err = parse_yaml::<MicroBenchmarkData>(
            "unit: us\nbaseline: Missing\nbenchmarks: [a]\nsystems:\n  - name: A\n    color: gray\n    times: [1.0]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("baseline system not found"));
    }

    #[test]
    fn test_hatch_from_yaml() {
        let data: MicroBenchmarkData = parse_yaml(
            "unit: us\nbaseline: A\nbenchmarks: [a]\nsystems:\n  - name: A\n    color: gray\n    times: [1.0]\n  - name: B\n    color: peach\n    times: [0.5]\n    hatch: dots\n",
        )
        .unwrap();
        assert_eq!(data.systems[0].hatch, Hatch::None);
        assert_eq!(data.systems[1].hatch, Hatch::Dots);

        let err = parse_yaml::<MicroBenchmarkData>(
            "unit: us\nbaseline: A\nbenchmarks: [a]\nsystems:\n  - name: A\n    color: gray\n    times: [1.0]\n    hatch: zigzag\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("error parsing figure data"));

        let defaults = MicroBenchmarkData::default();
        assert_eq!(defaults.systems[2].name, "Revmc");
        assert_eq!(defaults.systems[2].hatch, Hatch::Diagonal);
    }

    #[test]
    fn test_artifact_sizes_must_be_non_negative() {
        let err = parse_yaml::<StorageOverheadData>(
            "block_counts: [10, 20]\nblock_sizes_mb: [1.0, 2.0]\nartifacts_mb: [0.5, -0.5]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("artifacts_mb"));

        let err = parse_yaml::<StorageOverheadData>(
            "block_counts: [10, 20]\nblock_sizes_mb: [1.0, 2.0]\nartifacts_mb: [.nan, 0.5]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("field=artifacts_mb"));

        let data: StorageOverheadData = parse_yaml(
            "block_counts: [10, 20]\nblock_sizes_mb: [1.0, 2.0]\nartifacts_mb: [0.0, 0.5]\n",
        )
        .unwrap();
        assert_eq!(data.artifacts_mb, vec![0.0, 0.5]);
    }
}
