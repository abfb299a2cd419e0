use anyhow::Result;
use heval::{env::Env, tasks::dataset::ExecutionMode};
use std::{fs, path::Path, process::Command};

/// Write `block_stats_<mode>.csv` with the default columns.
pub fn write_block_stats(data_dir: &Path, mode: ExecutionMode, rows: &[(u64, f64)]) -> Result<()> {
    fs::create_dir_all(data_dir)?;

    let mut writer = csv::Writer::from_path(data_dir.join(mode.file_name()))?;
    writer.write_record(["block_number", "tx_count", "elapsed_time_ms"])?;
    for (block, elapsed) in rows {
        writer.write_record([block.to_string(), "1".to_string(), elapsed.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}

/// Populate `<root>/<group>/data` with all four execution modes. Every mode
/// covers blocks 1..=20 except `optim_partial`, which only covers the even
/// ones.
pub fn write_mode_fixtures(root: &Path, group: &str) -> Result<()> {
    let data_dir = Env::data_dir(root, group);
    let seq: Vec<(u64, f64)> = (1..=20).map(|b| (b, 10.0 * b as f64)).collect();
    let scaled = |factor: f64| -> Vec<(u64, f64)> {
        seq.iter().map(|(b, t)| (*b, t / factor)).collect()
    };

    write_block_stats(&data_dir, ExecutionMode::Seq, &seq)?;
    write_block_stats(&data_dir, ExecutionMode::Deter, &scaled(2.0))?;
    write_block_stats(&data_dir, ExecutionMode::Optim, &scaled(4.0))?;
    let partial: Vec<(u64, f64)> = scaled(8.0).into_iter().filter(|(b, _)| b % 2 == 0).collect();
    write_block_stats(&data_dir, ExecutionMode::OptimPartial, &partial)?;

    Ok(())
}

#[allow(dead_code)]
pub fn heval() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_heval"));
    cmd.env("RUST_LOG", "error");
    cmd
}
