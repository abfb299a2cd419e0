use crate::tasks::figures::{
    Figure, PlotContext,
    canvas::{
        Chart, Hatch, Plane, anchored, bold_style, build_plane, draw_category_labels, draw_legend,
        draw_x_desc, render, text_style,
    },
    color::{LABEL_FONT_SIZE, NOTE_FONT_SIZE, STROKE_WIDTH, TICK_FONT_SIZE, get_color_from_label},
    data::{StorageOverheadData, load_or_default},
};
use anyhow::Result;
use log::{error, info};
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, VPos},
};
use serde::Deserialize;
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

pub const PARETO_FILE_NAME: &str = "pareto.csv";
/// The largest sample gives the most stable shares.
pub const PARETO_BLOCK_COUNT: u64 = 5000;

// -------------------------------------------------------------------------
// Pareto cumulative curve
// -------------------------------------------------------------------------

/// Share of executions handled by the top 10/20/50% of paths, as fractions.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ParetoRow {
    pub block_count: u64,
    pub top10: f64,
    pub top20: f64,
    pub top50: f64,
}

impl ParetoRow {
    pub fn from_path(path: &Path, block_count: u64) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            let reason = format!("error opening file (path={}, error={e:?})", path.display());
            error!("{reason}");
            anyhow::anyhow!(reason)
        })?;

        Self::from_reader(file, block_count)
    }

    pub fn from_reader<R: Read>(reader: R, block_count: u64) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for result in reader.deserialize() {
            let row: ParetoRow = result.map_err(|e| {
                let reason = format!("error parsing pareto row (error={e})");
                error!("{reason}");
                anyhow::anyhow!(reason)
            })?;
            if row.block_count != block_count {
                continue;
            }

            for share in [row.top10, row.top20, row.top50] {
                if !(0.0..=1.0).contains(&share) {
                    error!("pareto share out of range (block_count={block_count}, value={share})");
                    anyhow::bail!(
                        "pareto share out of range (block_count={block_count}, value={share})"
                    );
                }
            }
            return Ok(row);
        }

        error!("no pareto row for block count (block_count={block_count})");
        anyhow::bail!("no pareto row for block count (block_count={block_count})")
    }
}

/// Cumulative curve `(percent of paths, percent of executions)`. The top 1%
/// and 5% shares are fixed measurements.
pub fn cumulative_points(row: &ParetoRow) -> Vec<(f64, f64)> {
    vec![
        (0.0, 0.0),
        (1.0, 70.0),
        (5.0, 85.0),
        (10.0, row.top10 * 100.0),
        (20.0, row.top20 * 100.0),
        (50.0, row.top50 * 100.0),
        (100.0, 100.0),
    ]
}

/// Region between the curve and the uniform diagonal.
pub fn locality_region(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut region = points.to_vec();
    region.extend(points.iter().rev().map(|(x, _)| (*x, *x)));
    region
}

pub struct ParetoChart {
    pub row: ParetoRow,
}

/// Boxed label at `text_at` with a leader line to `point`.
fn annotate<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Plane<'_, DB>,
    point: (f64, f64),
    text_at: (f64, f64),
    label: &str,
    color: &RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    chart.plotting_area().draw(&PathElement::new(
        vec![text_at, point],
        color.stroke_width(2),
    ))?;

    let (px, py) = chart.plotting_area().map_coordinate(&text_at);
    let corners = [(px - 24, py - 13), (px + 24, py + 13)];
    root.draw(&Rectangle::new(corners, WHITE.filled()))?;
    root.draw(&Rectangle::new(corners, color.stroke_width(2)))?;
    root.draw(&Text::new(
        label.to_string(),
        (px, py),
        anchored(bold_style(NOTE_FONT_SIZE), HPos::Center, VPos::Center),
    ))?;

    Ok(())
}

impl Chart for ParetoChart {
    fn file_stem(&self) -> String {
        "pareto_cumulative".to_string()
    }

    fn size(&self) -> (u32, u32) {
        (800, 620)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let red = get_color_from_label("red")?;
        let gray = get_color_from_label("gray")?;
        let points = cumulative_points(&self.row);

        let mut chart = build_plane(
            root,
            Some("Extreme Path Locality: Top 1% Paths Handle 70% Executions"),
            -2f64..102f64,
            -2f64..102f64,
            80,
            90,
        )?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|_| String::new())
            .light_line_style(WHITE)
            .bold_line_style(BLACK.mix(0.15))
            .y_desc("Fraction of Frame Executions (%)")
            .axis_desc_style(bold_style(LABEL_FONT_SIZE))
            .y_label_style(text_style(TICK_FONT_SIZE))
            .y_label_formatter(&|y| format!("{y:.0}"))
            .draw()?;

        let ticks = [1.0, 5.0, 10.0, 20.0, 50.0, 100.0];
        for x in ticks {
            chart
                .plotting_area()
                .draw(&PathElement::new(vec![(x, -2.0), (x, 102.0)], BLACK.mix(0.15)))?;
        }

        chart.draw_series(std::iter::once(Polygon::new(
            locality_region(&points),
            red.mix(0.15).filled(),
        )))?;
        chart.draw_series(LineSeries::new(
            vec![(0.0, 0.0), (100.0, 100.0)],
            gray.mix(0.6).stroke_width(2),
        ))?;
        chart.draw_series(LineSeries::new(
            points.clone(),
            red.stroke_width(STROKE_WIDTH),
        ))?;
        chart.draw_series(
            points
                .iter()
                .map(|point| Circle::new(*point, 6, red.filled())),
        )?;

        annotate(root, &chart, points[1], (8.0, 58.0), "70%", &red)?;
        annotate(root, &chart, points[2], (12.0, 78.0), "85%", &red)?;
        annotate(
            root,
            &chart,
            points[3],
            (22.0, 88.0),
            &format!("{:.0}%", points[3].1),
            &red,
        )?;

        let (right, bottom) = chart.plotting_area().map_coordinate(&(102.0, -2.0));
        draw_legend(
            root,
            &[("Uniform Distribution".to_string(), gray, Hatch::None)],
            (right - 220, bottom - 36),
            220,
            1,
            NOTE_FONT_SIZE,
        )?;

        let labels: Vec<(f64, String)> = ticks
            .iter()
            .map(|x| (*x, format!("{x:.0}")))
            .collect();
        draw_category_labels(root, &chart, &labels, TICK_FONT_SIZE)?;
        draw_x_desc(
            root,
            &chart,
            "Fraction of Unique Paths (%)",
            TICK_FONT_SIZE as i32 + 16,
        )?;

        Ok(())
    }
}

pub fn plot_pareto_cumulative(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::ParetoCumulative;
    let path = ctx.data_dir(figure).join(PARETO_FILE_NAME);
    let row = ParetoRow::from_path(&path, PARETO_BLOCK_COUNT)?;
    info!(
        "pareto shares at {} blocks: top10={:.3}, top20={:.3}, top50={:.3}",
        row.block_count, row.top10, row.top20, row.top50
    );

    render(&ParetoChart { row }, &ctx.plots_dir(figure), ctx.format)
}

// -------------------------------------------------------------------------
// Storage overhead
// -------------------------------------------------------------------------

/// `1234567` -> `1,234,567`.
pub fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageRow {
    pub blocks: u64,
    pub block_mb: f64,
    pub artifacts_mb: f64,
    /// Artifacts as a percentage of block data.
    pub overhead_pct: f64,
}

pub fn overhead_rows(data: &StorageOverheadData) -> Vec<StorageRow> {
    data.block_counts
        .iter()
        .zip(&data.block_sizes_mb)
        .zip(&data.artifacts_mb)
        .map(|((blocks, block_mb), artifacts_mb)| StorageRow {
            blocks: *blocks,
            block_mb: *block_mb,
            artifacts_mb: *artifacts_mb,
            overhead_pct: artifacts_mb / block_mb * 100.0,
        })
        .collect()
}

/// Artifact cost per block in KB for the first and last rows, and the
/// relative reduction between them in percent.
pub fn per_block_cost(data: &StorageOverheadData) -> Option<(f64, f64, f64)> {
    let rows = overhead_rows(data);
    let first = rows.first()?;
    let last = rows.last()?;

    let kb_per_block = |row: &StorageRow| row.artifacts_mb * 1024.0 / row.blocks as f64;
    let (first_kb, last_kb) = (kb_per_block(first), kb_per_block(last));
    let reduction = if first_kb > 0.0 {
        (1.0 - last_kb / first_kb) * 100.0
    } else {
        0.0
    };

    Some((first_kb, last_kb, reduction))
}

pub fn storage_lines(data: &StorageOverheadData) -> Vec<String> {
    let rows = overhead_rows(data);
    let mut lines = vec![String::new(), "=== Storage Growth Statistics ===".to_string()];
    for row in &rows {
        lines.push(format!(
            "{:5} blocks: Block Data = {:7.2} MB, Artifacts = {:3.0} MB ({:4.1}% overhead)",
            row.blocks, row.block_mb, row.artifacts_mb, row.overhead_pct
        ));
    }

    if let (Some((first_kb, last_kb, reduction)), Some(first), Some(last)) =
        (per_block_cost(data), rows.first(), rows.last())
    {
        lines.push(String::new());
        lines.push("Average per-block cost:".to_string());
        lines.push(format!(
            "  First {} blocks: {first_kb:.2} KB/block",
            with_thousands(first.blocks)
        ));
        lines.push(format!(
            "  All {} blocks:   {last_kb:.2} KB/block",
            with_thousands(last.blocks)
        ));
        lines.push(format!("  Reduction:          {reduction:.1}%"));
    }

    lines
}

pub struct StorageChart {
    pub data: StorageOverheadData,
}

impl Chart for StorageChart {
    fn file_stem(&self) -> String {
        "storage_growth".to_string()
    }

    fn size(&self) -> (u32, u32) {
        (900, 580)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let rows = overhead_rows(&self.data);
        let blocks_color = get_color_from_label("ocean")?;
        let artifacts_color = get_color_from_label("plum")?;

        let x_min = rows.iter().map(|r| r.blocks).min().unwrap_or(0) as f64;
        let x_max = rows.iter().map(|r| r.blocks).max().unwrap_or(1) as f64;
        let pad = ((x_max - x_min) * 0.05).max(1.0);
        let y_max = rows.iter().map(|r| r.block_mb).fold(0.0, f64::max) * 1.15;

        let mut chart = build_plane(
            root,
            Some("Storage Growth: Block Data vs. Helios Artifacts"),
            x_min - pad..x_max + pad,
            0f64..y_max,
            70,
            90,
        )?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|_| String::new())
            .light_line_style(WHITE)
            .bold_line_style(BLACK.mix(0.15))
            .y_desc("Storage Size (MB)")
            .axis_desc_style(bold_style(LABEL_FONT_SIZE))
            .y_label_style(text_style(TICK_FONT_SIZE))
            .y_label_formatter(&|y| with_thousands(y.max(0.0) as u64))
            .draw()?;

        chart.draw_series(LineSeries::new(
            rows.iter().map(|r| (r.blocks as f64, r.block_mb)),
            blocks_color.stroke_width(STROKE_WIDTH),
        ))?;
        chart.draw_series(LineSeries::new(
            rows.iter().map(|r| (r.blocks as f64, r.artifacts_mb)),
            artifacts_color.stroke_width(STROKE_WIDTH),
        ))?;

        // Hollow markers: circles for block data, squares for artifacts.
        for row in &rows {
            let (bx, by) = chart
                .plotting_area()
                .map_coordinate(&(row.blocks as f64, row.block_mb));
            root.draw(&Circle::new((bx, by), 6, WHITE.filled()))?;
            root.draw(&Circle::new((bx, by), 6, blocks_color.stroke_width(2)))?;

            let (ax, ay) = chart
                .plotting_area()
                .map_coordinate(&(row.blocks as f64, row.artifacts_mb));
            let corners = [(ax - 6, ay - 6), (ax + 6, ay + 6)];
            root.draw(&Rectangle::new(corners, WHITE.filled()))?;
            root.draw(&Rectangle::new(corners, artifacts_color.stroke_width(2)))?;
            root.draw(&Text::new(
                format!("{:.1}%", row.overhead_pct),
                (ax, ay - 12),
                anchored(
                    bold_style(NOTE_FONT_SIZE).color(&artifacts_color),
                    HPos::Center,
                    VPos::Bottom,
                ),
            ))?;
        }

        let (left, top) = chart.plotting_area().map_coordinate(&(x_min - pad, y_max));
        draw_legend(
            root,
            &[
                ("Block Data".to_string(), blocks_color, Hatch::None),
                ("Helios Artifacts".to_string(), artifacts_color, Hatch::None),
            ],
            (left + 12, top + 12),
            200,
            1,
            NOTE_FONT_SIZE + 2,
        )?;

        let labels: Vec<(f64, String)> = rows
            .iter()
            .map(|r| (r.blocks as f64, with_thousands(r.blocks)))
            .collect();
        draw_category_labels(root, &chart, &labels, TICK_FONT_SIZE)?;
        draw_x_desc(
            root,
            &chart,
            "Number of Blocks",
            TICK_FONT_SIZE as i32 + 16,
        )?;

        Ok(())
    }
}

pub fn plot_storage_overhead(ctx: &PlotContext) -> Result<Vec<PathBuf>> {
    let figure = Figure::StorageOverhead;
    let path = ctx.data_dir(figure).join(format!("{}.yaml", figure.name()));
    let data: StorageOverheadData = load_or_default(&path)?;
    let lines = storage_lines(&data);

    let paths = render(&StorageChart { data }, &ctx.plots_dir(figure), ctx.format)?;
    for line in lines {
        println!("{line}");
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARETO_CSV: &str = "\
block_count,top10,top20,top50
1000,0.90,0.95,0.99
5000, 0.93 ,0.96,0.995
";

    #[test]
    fn test_pareto_row_selection() {
        let row = ParetoRow::from_reader(PARETO_CSV.as_bytes(), PARETO_BLOCK_COUNT).unwrap();
        assert_eq!(row.block_count, 5000);
        assert_eq!(row.top10, 0.93);

        let points = cumulative_points(&row);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0], (0.0, 0.0));
        assert_eq!(points[1], (1.0, 70.0));
        assert!((points[3].1 - 93.0).abs() < 1e-9);
        assert_eq!(points[6], (100.0, 100.0));
    }

    #[test]
    fn test_pareto_missing_row() {
        let err = ParetoRow::from_reader(PARETO_CSV.as_bytes(), 4000).unwrap_err();
        assert!(err.to_string().contains("block_count=4000"));
    }

    #[test]
    fn test_pareto_share_range() {
        let csv = "block_count,top10,top20,top50\n5000,93,96,99\n";
        assert!(ParetoRow::from_reader(csv.as_bytes(), 5000).is_err());
    }

    #[test]
    fn test_locality_region_closes_on_diagonal() {
        let points = vec![(0.0, 0.0), (10.0, 50.0), (100.0, 100.0)];
        let region = locality_region(&points);

        assert_eq!(region.len(), 6);
        assert_eq!(region[3], (100.0, 100.0));
        assert_eq!(region[4], (10.0, 10.0));
        assert_eq!(region[5], (0.0, 0.0));
    }

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(5000), "5,000");
        assert_eq!(with_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_storage_overhead() {
        let data = StorageOverheadData::default();
        let rows = overhead_rows(&data);

        assert_eq!(rows.len(), 5);
        assert!((rows[0].overhead_pct - 119.0 / 227.93 * 100.0).abs() < 1e-9);

        let (first_kb, last_kb, reduction) = per_block_cost(&data).unwrap();
        assert!((first_kb - 121.856).abs() < 1e-9);
        assert!((last_kb - 87.2448).abs() < 1e-9);
        assert!((reduction - 28.4).abs() < 0.05);
    }

    #[test]
    fn test_storage_lines() {
        let lines = storage_lines(&StorageOverheadData::default());

        assert_eq!(lines[1], "=== Storage Growth Statistics ===");
        assert_eq!(
            lines[2],
            " 1000 blocks: Block Data =  227.93 MB, Artifacts = 119 MB (52.2% overhead)"
        );
        assert!(lines.iter().any(|l| l == "  First 1,000 blocks: 121.86 KB/block"));
        assert!(lines.iter().any(|l| l == "  All 5,000 blocks:   87.24 KB/block"));
        assert!(lines.iter().any(|l| l == "  Reduction:          28.4%"));
    }
}
