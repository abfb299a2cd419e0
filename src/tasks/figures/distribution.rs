use crate::tasks::{
    bins::{BinPartition, Distribution},
    dataset::{ExecutionMode, common_keys, load_mode},
    figures::{
        Figure, PlotContext,
        canvas::{
            Chart, Hatch, build_plane, draw_category_labels, draw_category_mesh, draw_hatched_bar,
            draw_legend, draw_text_box, draw_x_desc, nice_ceiling, render,
        },
        color::{LABEL_FONT_SIZE, NOTE_FONT_SIZE, TICK_FONT_SIZE, get_color_from_label},
    },
    report,
    speedup::SpeedupSeries,
};
use anyhow::Result;
use log::info;
use plotters::{coord::Shift, prelude::*};
use std::path::PathBuf;

/// Percentage of blocks per speedup bin for a single series.
#[derive(Debug, Clone)]
pub struct SpeedupHistogram {
    pub file_stem: String,
    pub title: String,
    pub bins: BinPartition,
    pub dist: Distribution,
    pub color: RGBColor,
    /// Lines shown in a box in the top-right corner.
    pub stats_box: Vec<String>,
    /// Label every n-th bin (the last bin is always labelled).
    pub tick_every: usize,
    pub size: (u32, u32),
}

impl SpeedupHistogram {
    fn tick_indices(&self) -> Vec<usize> {
        let n = self.bins.len();
        let step = self.tick_every.max(1);
        let mut ticks: Vec<usize> = (0..n).step_by(step).collect();
        if n > 0 && ticks.last() != Some(&(n - 1)) {
            ticks.push(n - 1);
        }

        ticks
    }
}

impl Chart for SpeedupHistogram {
    fn file_stem(&self) -> String {
        self.file_stem.clone()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let n = self.bins.len() as f64;
        let y_max = nice_ceiling(self.dist.max_percentage() * 1.1);

        let mut chart = build_plane(
            root,
            Some(&self.title),
            -0.5..n - 0.5,
            0f64..y_max,
            70,
            80,
        )?;
        draw_category_mesh(&mut chart, "Block Percentage", &|y| format!("{y:.0}%"))?;

        for (idx, pct) in self.dist.percentages.iter().enumerate() {
            let x = idx as f64;
            chart.plotting_area().draw(&Rectangle::new(
                [(x - 0.4, 0.0), (x + 0.4, *pct)],
                self.color.filled(),
            ))?;
        }

        let labels: Vec<(f64, String)> = self
            .tick_indices()
            .into_iter()
            .map(|idx| (idx as f64, self.bins.labels()[idx].clone()))
            .collect();
        draw_category_labels(root, &chart, &labels, TICK_FONT_SIZE)?;
        draw_x_desc(root, &chart, "Speedup", TICK_FONT_SIZE as i32 + 16)?;

        if !self.stats_box.is_empty() {
            let (right, top) = chart.plotting_area().map_coordinate(&(n - 0.5, y_max));
            draw_text_box(root, &self.stats_box, (right - 10, top + 10), NOTE_FONT_SIZE)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GroupedSeries {
    pub label: String,
    pub dist: Distribution,
    pub color: RGBColor,
    pub hatch: Hatch,
}

/// Several distributions over the same bins, drawn as grouped bars.
#[derive(Debug, Clone)]
pub struct GroupedDistribution {
    pub file_stem: String,
    pub bins: BinPartition,
    pub series: Vec<GroupedSeries>,
    pub size: (u32, u32),
}

impl GroupedDistribution {
    /// Bar centre offsets within a bin, symmetric around the bin centre.
    pub fn offsets(&self) -> (f64, Vec<f64>) {
        let k = self.series.len().max(1) as f64;
        let width = 0.8 / k;
        let offsets = (0..self.series.len())
            .map(|j| (j as f64 - (k - 1.0) / 2.0) * width)
            .collect();

        (width, offsets)
    }
}

impl Chart for GroupedDistribution {
    fn file_stem(&self) -> String {
        self.file_stem.clone()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let n = self.bins.len() as f64;
        let max_pct = self
            .series
            .iter()
            .map(|s| s.dist.max_percentage())
            .fold(0.0, f64::max);
        let y_max = nice_ceiling(max_pct * 1.15);

        let mut chart = build_plane(root, None, -0.5..n - 0.5, 0f64..y_max, 70, 80)?;
        draw_category_mesh(&mut chart, "Block Percentage (%)", &|y| format!("{y:.0}"))?;

        let (width, offsets) = self.offsets();
        for (series, offset) in self.series.iter().zip(&offsets) {
            for (idx, pct) in series.dist.percentages.iter().enumerate() {
                let center = idx as f64 + offset;
                draw_hatched_bar(
                    root,
                    &chart,
                    center - width / 2.0..center + width / 2.0,
                    0.0..*pct,
                    &series.color,
                    series.hatch,
                )?;
            }
        }

        let labels: Vec<(f64, String)> = self
            .bins
            .labels()
            .iter()
            .enumerate()
            .map(|(idx, label)| (idx as f64, label.clone()))
            .collect();
        draw_category_labels(root, &chart, &labels, TICK_FONT_SIZE)?;
        draw_x_desc(root, &chart, "Speedup Range", TICK_FONT_SIZE as i32 + 16)?;

        let entries: Vec<(String, RGBColor, Hatch)> = self
            .series
            .iter()
            .map(|s| (s.label.clone(), s.color, s.hatch))
            .collect();
        let (right, top) = chart.plotting_area().map_coordinate(&(n - 0.5, y_max));
        let legend_width = 240;
        draw_legend(
            root,
            &entries,
            (right - legend_width, top + 10),
            legend_width,
            1,
            LABEL_FONT_SIZE - 4,
        )?;

        Ok(())
    }
}

fn stats_box_lines(series: &SpeedupSeries) -> Result<Vec<String>> {
    let summary = series.summary()?;
    Ok(vec![
        format!("P50: {:.2}×", summary.median),
        format!("P75: {:.2}×", summary.p75),
        format!("P90: {:.2}×", summary.p90),
    ])
}

fn plot_single_mode(
    ctx: &PlotContext,
    figure: Figure,
    mode: ExecutionMode,
    label: &str,
    title: &str,
    file_stem: &str,
) -> Result<Vec<PathBuf>> {
    let data_dir = ctx.data_dir(figure);
    let seq = load_mode(&data_dir, ExecutionMode::Seq)?;
    let target = load_mode(&data_dir, mode)?;
    info!(
        "total common blocks: {}",
        common_keys(&[&seq, &target]).len()
    );

    let series = SpeedupSeries::compute(label, &seq, &target, None)?;
    report::print_summary(label, &series.summary()?);

    let bins = BinPartition::coarse();
    let dist = series.distribution(&bins)?;
    let chart = SpeedupHistogram {
        file_stem: file_stem.to_string(),
        title: title.to_string(),
        bins: bins.clone(),
        dist: dist.clone(),
        color: get_color_from_label("steel-blue")?,
        stats_box: stats_box_lines(&series)?,
        tick_every: 1,
        size: (1000, 550),
    };
    let paths = render(&chart, &ctx.plots_dir(figure), ctx.format)?;
    report::print_distribution(&bins, &dist);

    Ok(paths)
}

pub fn plot_replay_speedup(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    plot_single_mode(
        ctx,
        Figure::ReplaySpeedup,
        ExecutionMode::Deter,
        "Replay Mode (Deter)",
        "Replay Mode Speedup Distribution",
        "replay_speedup_distribution",
    )
}

pub fn plot_online_speedup(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    plot_single_mode(
        ctx,
        Figure::OnlineSpeedup,
        ExecutionMode::OptimPartial,
        "Online Mode (Frequency ≥10)",
        "Online Mode Speedup Distribution (Frequency ≥10)",
        "online_filtered_speedup_distribution",
    )
}

/// Fine-grained histograms per mode. Deter and optim are compared on the
/// blocks shared by seq, deter and optim; optim_partial on its own overlap
/// with seq.
pub fn plot_e2e_speedup(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::E2eSpeedup;
    let data_dir = ctx.data_dir(figure);
    let seq = load_mode(&data_dir, ExecutionMode::Seq)?;
    let deter = load_mode(&data_dir, ExecutionMode::Deter)?;
    let optim = load_mode(&data_dir, ExecutionMode::Optim)?;
    let optim_partial = load_mode(&data_dir, ExecutionMode::OptimPartial)?;

    let common = common_keys(&[&seq, &deter, &optim]);
    info!("total common blocks (seq/deter/optim): {}", common.len());

    let runs = [
        (ExecutionMode::Deter, "Deter", &deter, Some(&common)),
        (ExecutionMode::Optim, "Optim", &optim, Some(&common)),
        (ExecutionMode::OptimPartial, "Optim Partial", &optim_partial, None),
    ];

    let bins = BinPartition::fine();
    let color = get_color_from_label("sky-blue")?;
    let mut paths = Vec::new();
    for (mode, name, target, subset) in runs {
        let series = SpeedupSeries::compute(name, &seq, target, subset)?;
        let summary = series.summary()?;
        println!("\n{name} speedup stats ({} blocks):", summary.count);
        println!("  Min: {:.2}x", summary.min);
        println!("  Max: {:.2}x", summary.max);
        println!("  Mean: {:.2}x", summary.mean);
        println!("  Median: {:.2}x", summary.median);

        let chart = SpeedupHistogram {
            file_stem: format!("{mode}_speedup_distribution"),
            title: format!("{name} Speedup Distribution"),
            bins: bins.clone(),
            dist: series.distribution(&bins)?,
            color,
            stats_box: vec![],
            tick_every: 5,
            size: (1400, 600),
        };
        paths.append(&mut render(
            &chart,
            &ctx.plots_dir(figure),
            ctx.format,
        )?);
    }

    Ok(paths)
}

pub fn plot_combined_speedup(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::CombinedSpeedup;
    let data_dir = ctx.data_dir(figure);
    let seq = load_mode(&data_dir, ExecutionMode::Seq)?;

    let modes = [
        (ExecutionMode::Deter, "Replay", "helios", Hatch::None),
        (ExecutionMode::Optim, "Online", "orange", Hatch::Diagonal),
        (
            ExecutionMode::OptimPartial,
            "Online (filtered)",
            "light-blue",
            Hatch::Dots,
        ),
    ];

    let bins = BinPartition::coarse();
    let mut series = Vec::new();
    println!("{}", "=".repeat(60));
    println!("SPEEDUP STATISTICS");
    println!("{}", "=".repeat(60));
    for (mode, label, color, hatch) in modes {
        let target = load_mode(&data_dir, mode)?;
        let speedups = SpeedupSeries::compute(label, &seq, &target, None)?;
        let summary = speedups.summary()?;
        println!("\n{label} (n={}):", summary.count);
        println!("  {}", report::percentile_line(&summary));

        series.push(GroupedSeries {
            label: label.to_string(),
            dist: speedups.distribution(&bins)?,
            color: get_color_from_label(color)?,
            hatch,
        });
    }

    let chart = GroupedDistribution {
        file_stem: "combined_speedup_distribution".to_string(),
        bins: bins.clone(),
        series,
        size: (900, 600),
    };
    let paths = render(&chart, &ctx.plots_dir(figure), ctx.format)?;

    let columns: Vec<(&str, &Distribution)> = chart
        .series
        .iter()
        .map(|s| (s.label.as_str(), &s.dist))
        .collect();
    report::print_distribution_columns(&bins, &columns);

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(bins: BinPartition, tick_every: usize) -> SpeedupHistogram {
        let dist = bins.distribute(&[1.5]).unwrap();
        SpeedupHistogram {
            file_stem: "test".to_string(),
            title: "Test".to_string(),
            bins,
            dist,
            color: RGBColor(0, 0, 0),
            stats_box: vec![],
            tick_every,
            size: (100, 100),
        }
    }

    #[test]
    fn test_fine_ticks_include_last_bin() {
        let ticks = histogram(BinPartition::fine(), 5).tick_indices();

        assert_eq!(ticks.first(), Some(&0));
        assert_eq!(ticks[1], 5);
        assert_eq!(ticks.last(), Some(&50));
        assert_eq!(ticks.len(), 11);
    }

    #[test]
    fn test_coarse_ticks_label_every_bin() {
        let ticks = histogram(BinPartition::coarse(), 1).tick_indices();
        assert_eq!(ticks, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_grouped_offsets_are_centered() {
        let bins = BinPartition::coarse();
        let dist = bins.distribute(&[1.0]).unwrap();
        let chart = GroupedDistribution {
            file_stem: "grouped".to_string(),
            bins,
            series: ["a", "b", "c"]
                .iter()
                .map(|label| GroupedSeries {
                    label: label.to_string(),
                    dist: dist.clone(),
                    color: RGBColor(0, 0, 0),
                    hatch: Hatch::None,
                })
                .collect(),
            size: (100, 100),
        };

        let (width, offsets) = chart.offsets();
        assert!((width - 0.8 / 3.0).abs() < 1e-12);
        assert!((offsets[0] + width).abs() < 1e-12);
        assert!(offsets[1].abs() < 1e-12);
        assert!((offsets[2] - width).abs() < 1e-12);
    }
}
