use crate::tasks::figures::{
    Figure, PlotContext,
    canvas::{
        Chart, Plane, anchored, bold_style, build_plane, draw_bar, draw_category_labels,
        draw_category_mesh, draw_hatched_bar, draw_hline, draw_legend, draw_text_lines,
        italic_style, render, text_style,
    },
    color::{NOTE_FONT_SIZE, TICK_FONT_SIZE, get_color_from_label},
    data::{
        MicroBenchmarkData, NodeCountData, OverheadBreakdownData, ParallelInstructionData,
        load_or_default,
    },
};
use anyhow::Result;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, VPos},
};
use std::path::PathBuf;

fn data_file(ctx: &PlotContext, figure: Figure) -> PathBuf {
    ctx.data_dir(figure).join(format!("{}.yaml", figure.name()))
}

/// Label centered just above the data point `(x, y)`.
fn draw_value_label<'s, DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Plane<'_, DB>,
    (x, y): (f64, f64),
    label: &str,
    style: TextStyle<'s>,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (px, py) = chart.plotting_area().map_coordinate(&(x, y));
    root.draw(&Text::new(
        label.to_string(),
        (px, py - 4),
        anchored(style, HPos::Center, VPos::Bottom),
    ))?;

    Ok(())
}

// -------------------------------------------------------------------------
// Micro-benchmark
// -------------------------------------------------------------------------

pub struct MicroBenchmarkChart {
    pub data: MicroBenchmarkData,
}

impl MicroBenchmarkChart {
    /// Bar width and the centre offset of every system within a benchmark.
    fn layout(&self) -> (f64, Vec<f64>) {
        let k = self.data.systems.len().max(1) as f64;
        let width = 0.8 / k;
        let offsets = (0..self.data.systems.len())
            .map(|j| (j as f64 - (k - 1.0) / 2.0) * width)
            .collect();

        (width, offsets)
    }

    fn y_max(&self, speedups: &[(String, Vec<f64>)]) -> f64 {
        self.data.y_max.unwrap_or_else(|| {
            let max = speedups
                .iter()
                .flat_map(|(_, s)| s.iter().copied())
                .fold(1.0, f64::max);
            max * 1.3
        })
    }
}

impl Chart for MicroBenchmarkChart {
    fn file_stem(&self) -> String {
        "microbench_execution".to_string()
    }

    fn size(&self) -> (u32, u32) {
        (1000, 550)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let speedups = self.data.speedups()?;
        let n = self.data.benchmarks.len() as f64;
        let y_max = self.y_max(&speedups);

        let mut chart = build_plane(root, None, -0.5..n - 0.5, 0f64..y_max, 80, 90)?;
        draw_category_mesh(
            &mut chart,
            &format!("Speedup over {} (higher is better)", self.data.baseline),
            &|y| format!("{y:.1}"),
        )?;
        draw_hline(&chart, 1.0, BLACK.mix(0.5).stroke_width(1))?;

        let (width, offsets) = self.layout();
        for ((system, (_, values)), offset) in self.data.systems.iter().zip(&speedups).zip(&offsets)
        {
            let color = get_color_from_label(&system.color)?;
            for (idx, speedup) in values.iter().enumerate() {
                let center = idx as f64 + offset;
                draw_hatched_bar(
                    root,
                    &chart,
                    center - width / 2.0..center + width / 2.0,
                    0.0..*speedup,
                    &color,
                    system.hatch,
                )?;

                let style = if system.highlight {
                    bold_style(NOTE_FONT_SIZE - 1).color(&color)
                } else {
                    text_style(NOTE_FONT_SIZE - 3)
                };
                draw_value_label(
                    root,
                    &chart,
                    (center, *speedup),
                    &format!("{speedup:.2}×"),
                    style,
                )?;
            }
        }

        let labels: Vec<(f64, String)> = self
            .data
            .benchmarks
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as f64, name.clone()))
            .collect();
        draw_category_labels(root, &chart, &labels, TICK_FONT_SIZE)?;

        let (left, top) = chart.plotting_area().map_coordinate(&(-0.5, y_max));
        root.draw(&Text::new(
            "↑ Higher is faster",
            (left + 10, top + 8),
            anchored(italic_style(NOTE_FONT_SIZE), HPos::Left, VPos::Top),
        ))?;

        let entries = self
            .data
            .systems
            .iter()
            .map(|system| {
                let color = get_color_from_label(&system.color)?;
                Ok((system.name.clone(), color, system.hatch))
            })
            .collect::<Result<Vec<_>>>()?;
        draw_legend(root, &entries, (left + 10, top + 34), 210, 2, NOTE_FONT_SIZE)?;

        Ok(())
    }
}

/// Per-benchmark speedup table. The fastest system is starred.
pub fn micro_benchmark_lines(data: &MicroBenchmarkData) -> Result<Vec<String>> {
    let speedups = data.speedups()?;
    let mut lines = vec![
        "=".repeat(60),
        format!("SPEEDUP OVER {}", data.baseline.to_uppercase()),
        "=".repeat(60),
    ];

    for (idx, bench) in data.benchmarks.iter().enumerate() {
        let best = speedups
            .iter()
            .map(|(_, values)| values[idx])
            .fold(f64::MIN, f64::max);

        lines.push(String::new());
        lines.push(format!("{}:", bench.replace('\n', " ")));
        for (name, values) in &speedups {
            let label = format!("{name}:");
            let mut line = format!("  {label:<18}{:.2}×", values[idx]);
            if *name == data.baseline {
                line.push_str(" (baseline)");
            } else if values[idx] == best {
                line.push_str(" ★ BEST");
            }
            lines.push(line);
        }
    }

    Ok(lines)
}

pub fn plot_micro_benchmark(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::MicroBenchmark;
    let data: MicroBenchmarkData = load_or_default(&data_file(ctx, figure))?;
    let lines = micro_benchmark_lines(&data)?;

    let paths = render(&MicroBenchmarkChart { data }, &ctx.plots_dir(figure), ctx.format)?;
    for line in lines {
        println!("{line}");
    }

    Ok(paths)
}

// -------------------------------------------------------------------------
// Overhead breakdown
// -------------------------------------------------------------------------

pub struct OverheadBreakdownChart {
    pub data: OverheadBreakdownData,
}

const OVERHEAD_SPACING: f64 = 0.7;
const OVERHEAD_BAR_WIDTH: f64 = 0.5;

/// Bottom and top of every stacked segment, indexed `[component][configuration]`.
pub fn stack_segments(data: &OverheadBreakdownData) -> Vec<Vec<(f64, f64)>> {
    let mut bottoms = vec![0.0; data.configurations.len()];
    data.components
        .iter()
        .map(|component| {
            component
                .values
                .iter()
                .zip(bottoms.iter_mut())
                .map(|(value, bottom)| {
                    let segment = (*bottom, *bottom + value);
                    *bottom += value;
                    segment
                })
                .collect()
        })
        .collect()
}

impl Chart for OverheadBreakdownChart {
    fn file_stem(&self) -> String {
        "overhead-breakdown".to_string()
    }

    fn size(&self) -> (u32, u32) {
        (700, 480)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let totals = self.data.totals();
        let y_max = self
            .data
            .y_max
            .unwrap_or_else(|| totals.iter().copied().fold(0.0, f64::max) * 1.25);
        let x_end = (self.data.configurations.len() as f64 - 1.0) * OVERHEAD_SPACING + 0.4;

        let mut chart = build_plane(root, None, -0.4..x_end, 0f64..y_max, 50, 90)?;
        draw_category_mesh(
            &mut chart,
            &format!("Latency per Iteration ({})", self.data.unit),
            &|y| format!("{y:.0}"),
        )?;

        let half = OVERHEAD_BAR_WIDTH / 2.0;
        for (component, segments) in self.data.components.iter().zip(stack_segments(&self.data)) {
            let color = get_color_from_label(&component.color)?;
            for (idx, (bottom, top)) in segments.iter().enumerate() {
                let x = idx as f64 * OVERHEAD_SPACING;
                draw_hatched_bar(
                    root,
                    &chart,
                    x - half..x + half,
                    *bottom..*top,
                    &color,
                    component.hatch,
                )?;

                if let Some(note) = component.notes.get(idx) {
                    let (px, py) = chart
                        .plotting_area()
                        .map_coordinate(&(x, (bottom + top) / 2.0));
                    let value = format!("{:.0} {}", top - bottom, self.data.unit);
                    let style = anchored(bold_style(NOTE_FONT_SIZE - 2), HPos::Center, VPos::Center);
                    let line_height = NOTE_FONT_SIZE as i32;
                    draw_text_lines(
                        root,
                        &[value.as_str(), note.as_str()],
                        (px, py - line_height / 2),
                        &style,
                        line_height,
                    )?;
                }
            }
        }

        for (idx, total) in totals.iter().enumerate() {
            draw_value_label(
                root,
                &chart,
                (idx as f64 * OVERHEAD_SPACING, *total),
                &format!("{total:.0} {}", self.data.unit),
                bold_style(NOTE_FONT_SIZE),
            )?;
        }

        let labels: Vec<(f64, String)> = self
            .data
            .configurations
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as f64 * OVERHEAD_SPACING, name.clone()))
            .collect();
        draw_category_labels(root, &chart, &labels, TICK_FONT_SIZE)?;

        let entries = self
            .data
            .components
            .iter()
            .map(|c| Ok((c.name.clone(), get_color_from_label(&c.color)?, c.hatch)))
            .collect::<Result<Vec<_>>>()?;
        let (left, top) = chart.plotting_area().map_coordinate(&(-0.4, y_max));
        draw_legend(root, &entries, (left + 6, top + 6), 190, 3, NOTE_FONT_SIZE - 2)?;

        Ok(())
    }
}

pub fn plot_overhead_breakdown(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::OverheadBreakdown;
    let data: OverheadBreakdownData = load_or_default(&data_file(ctx, figure))?;
    let totals = data.totals();
    let unit = data.unit.clone();
    let configurations = data.configurations.clone();

    let paths = render(&OverheadBreakdownChart { data }, &ctx.plots_dir(figure), ctx.format)?;
    println!();
    for (name, total) in configurations.iter().zip(totals) {
        println!("Total {name}: {total:.2} {unit}");
    }

    Ok(paths)
}

// -------------------------------------------------------------------------
// Node count distribution
// -------------------------------------------------------------------------

pub struct NodeCountChart {
    pub data: NodeCountData,
}

impl NodeCountChart {
    /// Indices of the bars that carry a value label.
    pub fn labelled_bars(&self) -> Vec<usize> {
        self.data
            .percentages
            .iter()
            .enumerate()
            .filter(|(_, pct)| **pct >= self.data.label_threshold)
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl Chart for NodeCountChart {
    fn file_stem(&self) -> String {
        "node_distribution".to_string()
    }

    fn size(&self) -> (u32, u32) {
        (700, 480)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let n = self.data.ranges.len() as f64;
        let y_max = self.data.y_max.unwrap_or_else(|| {
            let max = self.data.percentages.iter().copied().fold(0.0, f64::max);
            (max * 1.15).ceil()
        });

        let mut chart = build_plane(root, None, -0.5..n - 0.5, 0f64..y_max, 70, 80)?;
        draw_category_mesh(&mut chart, "Percentage of Paths (%)", &|y| format!("{y:.0}"))?;

        let color = get_color_from_label("helios")?;
        for (idx, pct) in self.data.percentages.iter().enumerate() {
            let x = idx as f64;
            draw_bar(&chart, x - 0.4..x + 0.4, 0.0..*pct, &color)?;
        }
        for idx in self.labelled_bars() {
            let pct = self.data.percentages[idx];
            draw_value_label(
                root,
                &chart,
                (idx as f64, pct),
                &format!("{pct:.1}%"),
                bold_style(NOTE_FONT_SIZE - 4),
            )?;
        }

        let labels: Vec<(f64, String)> = self
            .data
            .ranges
            .iter()
            .enumerate()
            .map(|(idx, range)| (idx as f64, range.clone()))
            .collect();
        draw_category_labels(root, &chart, &labels, TICK_FONT_SIZE - 4)?;

        Ok(())
    }
}

pub fn plot_node_count(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::NodeCount;
    let data: NodeCountData = load_or_default(&data_file(ctx, figure))?;
    let total_graphs = data.total_graphs;

    let paths = render(&NodeCountChart { data }, &ctx.plots_dir(figure), ctx.format)?;
    println!("node count distribution over {total_graphs} graphs");

    Ok(paths)
}

// -------------------------------------------------------------------------
// Parallel instruction execution
// -------------------------------------------------------------------------

pub struct ParallelInstructionChart {
    pub data: ParallelInstructionData,
}

/// Caption under the chart comparing predicted and observed behaviour.
pub fn parallel_note(data: &ParallelInstructionData) -> Vec<String> {
    let predicted: Vec<String> = data
        .workloads
        .iter()
        .map(|w| format!("{:.1}×", w.theoretical_speedup()))
        .collect();
    let slowdowns: Vec<f64> = data.workloads.iter().map(|w| w.slowdown()).collect();
    let min = slowdowns.iter().copied().fold(f64::MAX, f64::min);
    let max = slowdowns.iter().copied().fold(f64::MIN, f64::max);

    vec![
        "Note: Critical Path Length Ratio (CPLR) analysis predicts theoretical speedups of"
            .to_string(),
        format!(
            "{} for these workloads. Actual performance shows {:.0}-{:.0}× slowdown instead.",
            predicted.join(", "),
            min.round(),
            max.round()
        ),
    ]
}

impl Chart for ParallelInstructionChart {
    fn file_stem(&self) -> String {
        "parallel_slowdown_corrected".to_string()
    }

    fn size(&self) -> (u32, u32) {
        (900, 620)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let (plot_area, note_area) = root.split_vertically(520);

        let slowdowns: Vec<f64> = self.data.workloads.iter().map(|w| w.slowdown()).collect();
        let n = slowdowns.len() as f64;
        let y_max = slowdowns.iter().copied().fold(0.0, f64::max) + 1.8;

        let mut chart = build_plane(
            &plot_area,
            Some(&self.data.title),
            -0.5..n - 0.5,
            0f64..y_max,
            70,
            80,
        )?;
        draw_category_mesh(&mut chart, "Parallel Slowdown vs. Revm Native", &|y| {
            format!("{y:.0}")
        })?;

        let color = get_color_from_label("red")?;
        for (idx, slowdown) in slowdowns.iter().enumerate() {
            let x = idx as f64;
            draw_bar(&chart, x - 0.3..x + 0.3, 0.0..*slowdown, &color)?;
            draw_value_label(
                &plot_area,
                &chart,
                (x, *slowdown),
                &format!("{slowdown:.1}× slower"),
                bold_style(NOTE_FONT_SIZE),
            )?;
        }

        let labels: Vec<(f64, String)> = self
            .data
            .workloads
            .iter()
            .enumerate()
            .map(|(idx, w)| (idx as f64, w.name.clone()))
            .collect();
        draw_category_labels(&plot_area, &chart, &labels, TICK_FONT_SIZE - 2)?;

        let (width, _) = note_area.dim_in_pixel();
        note_area.fill(&RGBColor(0xff, 0xff, 0xe0))?;
        let note = parallel_note(&self.data);
        let lines: Vec<&str> = note.iter().map(String::as_str).collect();
        draw_text_lines(
            &note_area,
            &lines,
            (width as i32 / 2, 24),
            &anchored(italic_style(NOTE_FONT_SIZE - 2), HPos::Center, VPos::Top),
            NOTE_FONT_SIZE as i32 + 6,
        )?;

        Ok(())
    }
}

pub fn plot_parallel_instruction(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::ParallelInstruction;
    let data: ParallelInstructionData = load_or_default(&data_file(ctx, figure))?;
    for workload in &data.workloads {
        println!(
            "{}: {:.1}× slower (theoretical {:.1}×)",
            workload.name.replace('\n', " "),
            workload.slowdown(),
            workload.theoretical_speedup()
        );
    }

    render(&ParallelInstructionChart { data }, &ctx.plots_dir(figure), ctx.format)
}
