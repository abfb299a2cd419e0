use anyhow::Result;
use heval::{
    env::Env,
    tasks::{
        bins::BinPartition,
        dataset::{ExecutionMode, common_keys, load_mode},
        figures::{
            self, Figure, OutputFormat, PlotContext,
            data::{MicroBenchmarkData, StorageOverheadData, load_or_default},
            lines::{PARETO_BLOCK_COUNT, ParetoRow, cumulative_points},
        },
        speedup::SpeedupSeries,
    },
};
use std::fs;
use tempfile::tempdir;

mod common;

#[test]
fn test_speedups_from_mode_files() -> Result<()> {
    let root = tempdir()?;
    common::write_mode_fixtures(root.path(), "e2e")?;
    let data_dir = Env::data_dir(root.path(), "e2e");

    let seq = load_mode(&data_dir, ExecutionMode::Seq)?;
    let deter = load_mode(&data_dir, ExecutionMode::Deter)?;
    let optim = load_mode(&data_dir, ExecutionMode::Optim)?;
    let partial = load_mode(&data_dir, ExecutionMode::OptimPartial)?;

    let common = common_keys(&[&seq, &deter, &optim]);
    assert_eq!(common.len(), 20);

    let series = SpeedupSeries::compute("optim", &seq, &optim, Some(&common))?;
    assert_eq!(series.len(), 20);
    assert!(series.ratios.iter().all(|r| (r - 4.0).abs() < 1e-9));

    let filtered = SpeedupSeries::compute("optim_partial", &seq, &partial, None)?;
    assert_eq!(filtered.len(), 10);
    assert!(filtered.keys.iter().all(|k| k % 2 == 0));

    let dist = filtered.distribution(&BinPartition::fine())?;
    assert_eq!(dist.total, 10);
    assert_eq!(dist.counts[8], 10);
    assert!((dist.percentages[8] - 100.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_missing_mode_file_fails() -> Result<()> {
    let root = tempdir()?;
    let ctx = PlotContext::new(root.path(), OutputFormat::Svg);

    let err = figures::plot(Figure::ReplaySpeedup, &ctx).unwrap_err();
    assert!(format!("{err:#}").contains("block_stats_seq.csv"));

    Ok(())
}

#[test]
fn test_yaml_overrides_builtin_data() -> Result<()> {
    let root = tempdir()?;
    let ctx = PlotContext::new(root.path(), OutputFormat::Svg);
    let path = ctx
        .data_dir(Figure::StorageOverhead)
        .join("storage-overhead.yaml");

    let defaults: StorageOverheadData = load_or_default(&path)?;
    assert_eq!(defaults, StorageOverheadData::default());

    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(
        &path,
        "block_counts: [100, 200]\nblock_sizes_mb: [10.0, 20.0]\nartifacts_mb: [1.0, 1.5]\n",
    )?;
    let custom: StorageOverheadData = load_or_default(&path)?;
    assert_eq!(custom.block_counts, vec![100, 200]);
    assert_eq!(custom.artifacts_mb, vec![1.0, 1.5]);

    Ok(())
}

#[test]
fn test_invalid_yaml_is_rejected() -> Result<()> {
    let root = tempdir()?;
    let path = root.path().join("micro-benchmark.yaml");
    fs::write(
        &path,
        "unit: us\nbaseline: A\nbenchmarks: [x, y]\nsystems:\n  - name: A\n    color: gray\n    times: [1.0]\n",
    )?;

    assert!(load_or_default::<MicroBenchmarkData>(&path).is_err());

    Ok(())
}

#[test]
fn test_pareto_csv_from_disk() -> Result<()> {
    let root = tempdir()?;
    let path = root.path().join("pareto.csv");
    fs::write(
        &path,
        "block_count,top10,top20,top50\n1000,0.91,0.95,0.99\n5000,0.93,0.96,0.99\n",
    )?;

    let row = ParetoRow::from_path(&path, PARETO_BLOCK_COUNT)?;
    let points = cumulative_points(&row);
    assert!((points[4].1 - 96.0).abs() < 1e-9);

    assert!(ParetoRow::from_path(&root.path().join("missing.csv"), 5000).is_err());

    Ok(())
}

#[test]
#[ignore = "text layout needs system fonts"]
fn test_plot_all_writes_every_figure() -> Result<()> {
    let root = tempdir()?;
    for group in ["replay-speedup", "online-speedup", "e2e"] {
        common::write_mode_fixtures(root.path(), group)?;
    }
    let pareto_dir = Env::data_dir(root.path(), "pareto-cumulative");
    fs::create_dir_all(&pareto_dir)?;
    fs::write(
        pareto_dir.join("pareto.csv"),
        "block_count,top10,top20,top50\n5000,0.93,0.96,0.99\n",
    )?;

    let ctx = PlotContext::new(root.path(), OutputFormat::Both);
    let paths = figures::plot_all(&ctx)?;

    // e2e-speedup writes one chart per mode.
    assert_eq!(paths.len(), 2 * 12);
    assert!(paths.iter().all(|p| p.exists()));
    assert!(
        Env::plots_dir(root.path(), "e2e")
            .join("combined_speedup_distribution.svg")
            .exists()
    );

    Ok(())
}
