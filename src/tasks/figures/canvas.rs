use crate::tasks::figures::{
    OutputFormat,
    color::{FONT_FAMILY, LABEL_FONT_SIZE, TICK_FONT_SIZE, TITLE_FONT_SIZE},
};
use anyhow::Result;
use log::{error, info};
use plotters::{
    coord::{Shift, cartesian::Cartesian2d, types::RangedCoordf64},
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use serde::Deserialize;
use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

pub type Plane<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// A figure that can be drawn onto any plotters backend.
pub trait Chart {
    fn file_stem(&self) -> String;

    fn size(&self) -> (u32, u32);

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

/// Draw `chart` once per requested format into `out_dir`.
pub fn render<C: Chart>(chart: &C, out_dir: &Path, format: OutputFormat) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| {
        let reason = format!(
            "error creating plot directory (path={}, error={e:?})",
            out_dir.display()
        );
        error!("{reason}");
        anyhow::anyhow!(reason)
    })?;

    let mut paths = Vec::new();
    if format.includes_svg() {
        let path = out_dir.join(format!("{}.svg", chart.file_stem()));
        {
            let root = SVGBackend::new(&path, chart.size()).into_drawing_area();
            root.fill(&WHITE)?;
            chart.draw(&root)?;
            root.present()?;
        }
        info!("generated plot at: {}", path.display());
        paths.push(path);
    }
    if format.includes_png() {
        let path = out_dir.join(format!("{}.png", chart.file_stem()));
        {
            let root = BitMapBackend::new(&path, chart.size()).into_drawing_area();
            root.fill(&WHITE)?;
            chart.draw(&root)?;
            root.present()?;
        }
        info!("generated plot at: {}", path.display());
        paths.push(path);
    }

    Ok(paths)
}

pub fn text_style(size: u32) -> TextStyle<'static> {
    (FONT_FAMILY, size).into_font().color(&BLACK)
}

pub fn bold_style(size: u32) -> TextStyle<'static> {
    (FONT_FAMILY, size)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
}

pub fn italic_style(size: u32) -> TextStyle<'static> {
    (FONT_FAMILY, size)
        .into_font()
        .style(FontStyle::Italic)
        .color(&BLACK)
}

pub fn anchored<'a>(style: TextStyle<'a>, h: HPos, v: VPos) -> TextStyle<'a> {
    style.pos(Pos::new(h, v))
}

pub fn build_plane<'a, DB>(
    root: &'a DrawingArea<DB, Shift>,
    title: Option<&str>,
    x: Range<f64>,
    y: Range<f64>,
    x_label_area: u32,
    y_label_area: u32,
) -> Result<Plane<'a, DB>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(20)
        .x_label_area_size(x_label_area)
        .y_label_area_size(y_label_area);
    if let Some(title) = title {
        builder.caption(title, bold_style(TITLE_FONT_SIZE));
    }

    Ok(builder.build_cartesian_2d(x, y)?)
}

/// Horizontal grid and y axis only. Category charts label their x axis by
/// hand with `draw_category_labels`.
pub fn draw_category_mesh<DB>(
    chart: &mut Plane<'_, DB>,
    y_desc: &str,
    y_format: &dyn Fn(&f64) -> String,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_x_axis()
        .x_label_formatter(&|_| String::new())
        .light_line_style(WHITE)
        .bold_line_style(BLACK.mix(0.15))
        .y_labels(8)
        .y_desc(y_desc)
        .axis_desc_style(bold_style(LABEL_FONT_SIZE))
        .y_label_style(text_style(TICK_FONT_SIZE))
        .y_label_formatter(y_format)
        .draw()?;

    let x = chart.x_range();
    let y0 = chart.y_range().start;
    chart
        .plotting_area()
        .draw(&PathElement::new(vec![(x.start, y0), (x.end, y0)], BLACK))?;

    Ok(())
}

pub fn draw_text_lines<'a, DB>(
    area: &DrawingArea<DB, Shift>,
    lines: &[&str],
    origin: (i32, i32),
    style: &TextStyle<'a>,
    line_height: i32,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    for (idx, line) in lines.iter().enumerate() {
        area.draw(&Text::new(
            line.to_string(),
            (origin.0, origin.1 + idx as i32 * line_height),
            style.clone(),
        ))?;
    }

    Ok(())
}

/// Write one label per category under the x axis. Labels may span several
/// lines.
pub fn draw_category_labels<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Plane<'_, DB>,
    labels: &[(f64, String)],
    size: u32,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let style = anchored(text_style(size), HPos::Center, VPos::Top);
    let y0 = chart.y_range().start;
    for (x, label) in labels {
        let (px, py) = chart.plotting_area().map_coordinate(&(*x, y0));
        let lines: Vec<&str> = label.lines().collect();
        draw_text_lines(root, &lines, (px, py + 8), &style, size as i32 + 4)?;
    }

    Ok(())
}

/// Axis title centered under the plotting area.
pub fn draw_x_desc<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Plane<'_, DB>,
    desc: &str,
    offset: i32,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x = chart.x_range();
    let (px, py) = chart
        .plotting_area()
        .map_coordinate(&((x.start + x.end) / 2.0, chart.y_range().start));
    root.draw(&Text::new(
        desc.to_string(),
        (px, py + offset),
        anchored(bold_style(LABEL_FONT_SIZE), HPos::Center, VPos::Top),
    ))?;

    Ok(())
}

/// Filled bar with a thin black frame.
pub fn draw_bar<DB>(
    chart: &Plane<'_, DB>,
    x: Range<f64>,
    y: Range<f64>,
    color: &RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let area = chart.plotting_area();
    area.draw(&Rectangle::new(
        [(x.start, y.start), (x.end, y.end)],
        color.filled(),
    ))?;
    area.draw(&PathElement::new(
        vec![
            (x.start, y.start),
            (x.end, y.start),
            (x.end, y.end),
            (x.start, y.end),
            (x.start, y.start),
        ],
        BLACK.stroke_width(1),
    ))?;

    Ok(())
}

/// Fill pattern drawn over a bar so that series stay distinguishable in
/// greyscale prints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hatch {
    #[default]
    None,
    /// Parallel lines rising to the right.
    Diagonal,
    Dots,
}

const HATCH_SPACING: i32 = 8;

impl Hatch {
    /// Line segments covering the pixel rectangle spanned by `a` and `b`.
    /// Every endpoint lies on or inside the rectangle.
    pub fn lines(self, a: (i32, i32), b: (i32, i32)) -> Vec<[(i32, i32); 2]> {
        if self != Hatch::Diagonal {
            return vec![];
        }

        let (left, right) = (a.0.min(b.0), a.0.max(b.0));
        let (top, bottom) = (a.1.min(b.1), a.1.max(b.1));
        let (w, h) = (right - left, bottom - top);

        // Points with (x - left) + (y - top) == c lie on one diagonal.
        (HATCH_SPACING..w + h)
            .step_by(HATCH_SPACING as usize)
            .map(|c| {
                let start = (c - h).max(0);
                let end = c.min(w);
                [
                    (left + start, top + (c - start)),
                    (left + end, top + (c - end)),
                ]
            })
            .collect()
    }

    /// Dot centres on a staggered grid strictly inside the rectangle.
    pub fn dots(self, a: (i32, i32), b: (i32, i32)) -> Vec<(i32, i32)> {
        if self != Hatch::Dots {
            return vec![];
        }

        let (left, right) = (a.0.min(b.0), a.0.max(b.0));
        let (top, bottom) = (a.1.min(b.1), a.1.max(b.1));
        let half = HATCH_SPACING / 2;

        let mut dots = Vec::new();
        for (row, y) in (top + half..bottom).step_by(half as usize).enumerate() {
            let shift = if row % 2 == 0 { half } else { HATCH_SPACING };
            for x in (left + shift..right).step_by(HATCH_SPACING as usize) {
                dots.push((x, y));
            }
        }

        dots
    }
}

/// Overlay `hatch` on the pixel rectangle spanned by `a` and `b`.
pub fn draw_hatch<DB>(
    root: &DrawingArea<DB, Shift>,
    a: (i32, i32),
    b: (i32, i32),
    hatch: Hatch,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let ink = BLACK.mix(0.6);
    for [from, to] in hatch.lines(a, b) {
        root.draw(&PathElement::new(vec![from, to], ink.stroke_width(1)))?;
    }
    for dot in hatch.dots(a, b) {
        root.draw(&Circle::new(dot, 1, ink.filled()))?;
    }

    Ok(())
}

/// `draw_bar` with a fill pattern on top.
pub fn draw_hatched_bar<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Plane<'_, DB>,
    x: Range<f64>,
    y: Range<f64>,
    color: &RGBColor,
    hatch: Hatch,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    draw_bar(chart, x.clone(), y.clone(), color)?;
    if hatch != Hatch::None {
        let area = chart.plotting_area();
        let a = area.map_coordinate(&(x.start, y.start));
        let b = area.map_coordinate(&(x.end, y.end));
        draw_hatch(root, a, b, hatch)?;
    }

    Ok(())
}

pub fn draw_hline<DB>(chart: &Plane<'_, DB>, y: f64, style: ShapeStyle) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x = chart.x_range();
    chart
        .plotting_area()
        .draw(&PathElement::new(vec![(x.start, y), (x.end, y)], style))?;

    Ok(())
}

/// Colour squares with a label each, laid out in `columns` columns from
/// `origin` (top-left, in pixels). Squares carry the entry's hatch.
pub fn draw_legend<DB>(
    root: &DrawingArea<DB, Shift>,
    entries: &[(String, RGBColor, Hatch)],
    origin: (i32, i32),
    column_width: i32,
    columns: usize,
    size: u32,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let square = size as i32;
    let columns = columns.max(1);
    let style = anchored(text_style(size), HPos::Left, VPos::Center);

    for (idx, (label, color, hatch)) in entries.iter().enumerate() {
        let x = origin.0 + (idx % columns) as i32 * column_width;
        let y = origin.1 + (idx / columns) as i32 * (square + 8);

        root.draw(&Rectangle::new(
            [(x, y), (x + square, y + square)],
            color.filled(),
        ))?;
        draw_hatch(root, (x, y), (x + square, y + square), *hatch)?;
        root.draw(&PathElement::new(
            vec![
                (x, y),
                (x + square, y),
                (x + square, y + square),
                (x, y + square),
                (x, y),
            ],
            BLACK,
        ))?;
        root.draw(&Text::new(
            label.clone(),
            (x + square + 8, y + square / 2),
            style.clone(),
        ))?;
    }

    Ok(())
}

/// White box with a dark frame holding `lines`, anchored at its top-right
/// corner.
pub fn draw_text_box<DB>(
    root: &DrawingArea<DB, Shift>,
    lines: &[String],
    top_right: (i32, i32),
    size: u32,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let style = anchored(text_style(size), HPos::Left, VPos::Top);
    let padding = 10;
    let line_height = size as i32 + 6;

    let mut text_width = 0;
    for line in lines {
        let (w, _) = root.estimate_text_size(line, &style)?;
        text_width = text_width.max(w as i32);
    }

    let (x1, y0) = top_right;
    let x0 = x1 - text_width - 2 * padding;
    let y1 = y0 + lines.len() as i32 * line_height + 2 * padding;

    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], WHITE.filled()))?;
    root.draw(&Rectangle::new(
        [(x0, y0), (x1, y1)],
        RGBColor(0x33, 0x33, 0x33).stroke_width(1),
    ))?;

    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    draw_text_lines(
        root,
        &lines,
        (x0 + padding, y0 + padding),
        &style,
        line_height,
    )
}

/// Round `value` up to a tick-friendly axis maximum.
pub fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powf(value.log10().floor());
    for step in [1.0, 2.0, 2.5, 5.0, 10.0] {
        let candidate = step * magnitude;
        if candidate >= value {
            return candidate;
        }
    }

    10.0 * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_accepts_borrowed_color() {
        let color = RGBColor(0x12, 0x34, 0x56);
        let style = anchored(bold_style(12).color(&color), HPos::Center, VPos::Bottom);

        assert_eq!(style.color.rgb, (0x12, 0x34, 0x56));
    }

    #[test]
    fn test_diagonal_hatch_stays_inside_bar() {
        let (a, b) = ((10, 90), (40, 20));
        let lines = Hatch::Diagonal.lines(a, b);

        // Diagonals every 8px across a 30x70 box.
        assert_eq!(lines.len(), 12);
        for [from, to] in &lines {
            for (x, y) in [from, to] {
                assert!((10..=40).contains(x), "x={x} outside bar");
                assert!((20..=90).contains(y), "y={y} outside bar");
            }
            // Rising to the right.
            assert!(to.0 > from.0 && to.1 < from.1);
            assert_eq!(to.0 - from.0, from.1 - to.1);
        }
    }

    #[test]
    fn test_dot_hatch_stays_inside_bar() {
        let dots = Hatch::Dots.dots((0, 0), (24, 16));

        assert!(!dots.is_empty());
        assert!(dots.iter().all(|(x, y)| (1..24).contains(x) && (1..16).contains(y)));
        assert!(Hatch::Dots.lines((0, 0), (24, 16)).is_empty());
    }

    #[test]
    fn test_no_hatch_draws_nothing() {
        assert!(Hatch::None.lines((0, 0), (50, 50)).is_empty());
        assert!(Hatch::None.dots((0, 0), (50, 50)).is_empty());
        assert!(Hatch::Diagonal.lines((5, 5), (5, 5)).is_empty());
    }

    #[test]
    fn test_nice_ceiling() {
        assert_eq!(nice_ceiling(0.0), 1.0);
        assert_eq!(nice_ceiling(3.3), 5.0);
        assert_eq!(nice_ceiling(47.0), 50.0);
        assert_eq!(nice_ceiling(55.0), 100.0);
        assert_eq!(nice_ceiling(20.0), 20.0);
        assert_eq!(nice_ceiling(0.18), 0.2);
    }
}
