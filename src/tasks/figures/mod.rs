use crate::env::Env;
use anyhow::Result;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};
use walkdir::WalkDir;

pub mod bars;
pub mod canvas;
pub mod color;
pub mod data;
pub mod distribution;
pub mod lines;

/// Evaluation figures. Speedup figures are computed from per-block CSVs, the
/// rest from small fixed datasets that can be overridden with YAML.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Figure {
    /// Replay (deterministic) mode speedup histogram
    ReplaySpeedup,
    /// Online mode speedup histogram, restricted to frequent paths
    OnlineSpeedup,
    /// Fine-grained speedup histograms for every mode
    E2eSpeedup,
    /// Replay, online and filtered-online distributions side by side
    CombinedSpeedup,
    /// Speedup of each engine on the micro-benchmarks
    MicroBenchmark,
    /// Stacked latency breakdown per iteration
    OverheadBreakdown,
    /// Distribution of graph node counts per path
    NodeCount,
    /// Slowdown of instruction-level parallel execution
    ParallelInstruction,
    /// Cumulative share of executions covered by the hottest paths
    ParetoCumulative,
    /// Storage growth of block data versus generated artifacts
    StorageOverhead,
}

impl Figure {
    pub const REPLAY_SPEEDUP_NAME: &'static str = "replay-speedup";
    pub const ONLINE_SPEEDUP_NAME: &'static str = "online-speedup";
    pub const E2E_SPEEDUP_NAME: &'static str = "e2e-speedup";
    pub const COMBINED_SPEEDUP_NAME: &'static str = "combined-speedup";
    pub const MICRO_BENCHMARK_NAME: &'static str = "micro-benchmark";
    pub const OVERHEAD_BREAKDOWN_NAME: &'static str = "overhead-breakdown";
    pub const NODE_COUNT_NAME: &'static str = "node-count";
    pub const PARALLEL_INSTRUCTION_NAME: &'static str = "parallel-instruction";
    pub const PARETO_CUMULATIVE_NAME: &'static str = "pareto-cumulative";
    pub const STORAGE_OVERHEAD_NAME: &'static str = "storage-overhead";

    pub fn iter_variants() -> std::slice::Iter<'static, Figure> {
        static VARIANTS: [Figure; 10] = [
            Figure::ReplaySpeedup,
            Figure::OnlineSpeedup,
            Figure::E2eSpeedup,
            Figure::CombinedSpeedup,
            Figure::MicroBenchmark,
            Figure::OverheadBreakdown,
            Figure::NodeCount,
            Figure::ParallelInstruction,
            Figure::ParetoCumulative,
            Figure::StorageOverhead,
        ];
        VARIANTS.iter()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Figure::ReplaySpeedup => Self::REPLAY_SPEEDUP_NAME,
            Figure::OnlineSpeedup => Self::ONLINE_SPEEDUP_NAME,
            Figure::E2eSpeedup => Self::E2E_SPEEDUP_NAME,
            Figure::CombinedSpeedup => Self::COMBINED_SPEEDUP_NAME,
            Figure::MicroBenchmark => Self::MICRO_BENCHMARK_NAME,
            Figure::OverheadBreakdown => Self::OVERHEAD_BREAKDOWN_NAME,
            Figure::NodeCount => Self::NODE_COUNT_NAME,
            Figure::ParallelInstruction => Self::PARALLEL_INSTRUCTION_NAME,
            Figure::ParetoCumulative => Self::PARETO_CUMULATIVE_NAME,
            Figure::StorageOverhead => Self::STORAGE_OVERHEAD_NAME,
        }
    }

    /// Directory under the evaluation root holding this figure's `data/` and
    /// `plots/`. Both end-to-end figures share one dataset.
    pub fn data_group(&self) -> &'static str {
        match self {
            Figure::E2eSpeedup | Figure::CombinedSpeedup => "e2e",
            _ => self.name(),
        }
    }

    /// Files read from the data directory. YAML files are optional.
    pub fn inputs(&self) -> Vec<String> {
        use crate::tasks::dataset::ExecutionMode;

        let modes: &[ExecutionMode] = match self {
            Figure::ReplaySpeedup => &[ExecutionMode::Seq, ExecutionMode::Deter],
            Figure::OnlineSpeedup => &[ExecutionMode::Seq, ExecutionMode::OptimPartial],
            Figure::E2eSpeedup | Figure::CombinedSpeedup => &[
                ExecutionMode::Seq,
                ExecutionMode::Deter,
                ExecutionMode::Optim,
                ExecutionMode::OptimPartial,
            ],
            Figure::ParetoCumulative => return vec![lines::PARETO_FILE_NAME.to_string()],
            _ => return vec![format!("{}.yaml (optional)", self.name())],
        };

        modes.iter().map(|mode| mode.file_name()).collect()
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Figure {
    type Err = ();

    fn from_str(input: &str) -> Result<Figure, Self::Err> {
        Figure::iter_variants()
            .find(|figure| figure.name() == input)
            .copied()
            .ok_or(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
    Both,
}

impl OutputFormat {
    pub fn includes_svg(&self) -> bool {
        matches!(self, OutputFormat::Svg | OutputFormat::Both)
    }

    pub fn includes_png(&self) -> bool {
        matches!(self, OutputFormat::Png | OutputFormat::Both)
    }
}

#[derive(Clone, Debug, Args)]
pub struct PlotArgs {
    /// Evaluation root holding one directory per figure group. Defaults to
    /// $HELIOS_EVAL_ROOT, then the current directory.
    #[arg(long)]
    pub root: Option<String>,
    /// Write every figure to this directory instead of <root>/<group>/plots
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Image format to write
    #[arg(long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,
}

/// Where figures read their inputs from and write their outputs to.
#[derive(Clone, Debug)]
pub struct PlotContext {
    pub root: PathBuf,
    pub out_dir: Option<PathBuf>,
    pub format: OutputFormat,
}

impl PlotContext {
    pub fn from_args(args: &PlotArgs) -> Result<Self> {
        Ok(Self {
            root: Env::eval_root(args.root.as_deref())?,
            out_dir: args.out_dir.clone(),
            format: args.format,
        })
    }

    pub fn new(root: &Path, format: OutputFormat) -> Self {
        Self {
            root: root.to_path_buf(),
            out_dir: None,
            format,
        }
    }

    pub fn data_dir(&self, figure: Figure) -> PathBuf {
        Env::data_dir(&self.root, figure.data_group())
    }

    pub fn plots_dir(&self, figure: Figure) -> PathBuf {
        match &self.out_dir {
            Some(dir) => dir.clone(),
            None => Env::plots_dir(&self.root, figure.data_group()),
        }
    }
}

/// Render `figure`, print its tables, and return the written files.
pub fn plot(figure: Figure, ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    info!("plotting {figure} (data={})", ctx.data_dir(figure).display());

    match figure {
        Figure::ReplaySpeedup => distribution::plot_replay_speedup(ctx),
        Figure::OnlineSpeedup => distribution::plot_online_speedup(ctx),
        Figure::E2eSpeedup => distribution::plot_e2e_speedup(ctx),
        Figure::CombinedSpeedup => distribution::plot_combined_speedup(ctx),
        Figure::MicroBenchmark => bars::plot_micro_benchmark(ctx),
        Figure::OverheadBreakdown => bars::plot_overhead_breakdown(ctx),
        Figure::NodeCount => bars::plot_node_count(ctx),
        Figure::ParallelInstruction => bars::plot_parallel_instruction(ctx),
        Figure::ParetoCumulative => lines::plot_pareto_cumulative(ctx),
        Figure::StorageOverhead => lines::plot_storage_overhead(ctx),
    }
}

/// Render every figure. A failing figure does not stop the others, but the
/// call fails if any of them did.
pub fn plot_all(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let pb = ProgressBar::new(Figure::iter_variants().len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")?
            .progress_chars("#>-"),
    );

    let mut paths = Vec::new();
    let mut failed = Vec::new();
    for figure in Figure::iter_variants() {
        pb.set_message(figure.to_string());
        match pb.suspend(|| plot(*figure, ctx)) {
            Ok(mut written) => paths.append(&mut written),
            Err(e) => {
                error!("error plotting figure (figure={figure}, error={e:#})");
                failed.push(figure.to_string());
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if !failed.is_empty() {
        anyhow::bail!("failed to plot figures (figures={})", failed.join(","));
    }

    Ok(paths)
}

/// Print every figure with its data directory, expected inputs, and the
/// files currently present there.
pub fn list(root: &Path) {
    let ctx = PlotContext::new(root, OutputFormat::default());

    for figure in Figure::iter_variants() {
        let data_dir = ctx.data_dir(*figure);
        println!("{figure}");
        println!("  data:    {}", data_dir.display());
        println!("  inputs:  {}", figure.inputs().join(", "));

        let present: Vec<String> = WalkDir::new(&data_dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        if present.is_empty() {
            println!("  present: -");
        } else {
            println!("  present: {}", present.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for figure in Figure::iter_variants() {
            assert_eq!(figure.to_string().parse::<Figure>(), Ok(*figure));
        }
        assert_eq!("unknown".parse::<Figure>(), Err(()));
    }

    #[test]
    fn test_e2e_figures_share_data() {
        assert_eq!(Figure::E2eSpeedup.data_group(), "e2e");
        assert_eq!(Figure::CombinedSpeedup.data_group(), "e2e");
        assert_eq!(Figure::NodeCount.data_group(), "node-count");

        let ctx = PlotContext::new(Path::new("/eval"), OutputFormat::Svg);
        assert_eq!(
            ctx.data_dir(Figure::CombinedSpeedup),
            PathBuf::from("/eval/e2e/data")
        );
    }

    #[test]
    fn test_out_dir_overrides_plots_dir() {
        let mut ctx = PlotContext::new(Path::new("/eval"), OutputFormat::Both);
        assert_eq!(
            ctx.plots_dir(Figure::ReplaySpeedup),
            PathBuf::from("/eval/replay-speedup/plots")
        );

        ctx.out_dir = Some(PathBuf::from("/tmp/figures"));
        assert_eq!(
            ctx.plots_dir(Figure::ReplaySpeedup),
            PathBuf::from("/tmp/figures")
        );
        assert!(ctx.format.includes_svg() && ctx.format.includes_png());
    }

    #[test]
    fn test_inputs() {
        assert_eq!(
            Figure::OnlineSpeedup.inputs(),
            vec!["block_stats_seq.csv", "block_stats_optim_partial.csv"]
        );
        assert_eq!(Figure::ParetoCumulative.inputs(), vec!["pareto.csv"]);
        assert_eq!(
            Figure::NodeCount.inputs(),
            vec!["node-count.yaml (optional)"]
        );
    }
}
