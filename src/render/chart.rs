//! Chart descriptions and their SVG rendering.
//!
//! Charts are plain data (serializable for the JSON API) built from an
//! aggregation result. `to_svg` draws them with plotters and takes no other
//! input, so the same aggregation always yields byte-identical output.

use crate::error::RenderError;
use crate::models::{humanize, percent, Cell, PairwiseAggregation, SingleAggregation};
use plotters::coord::ranged1d::{IntoSegmentedCoord, SegmentValue};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};

/// Heatmap fill at rate 0.
pub const LOW_COLOR: Rgb = Rgb(0xff, 0xf5, 0xf0);
/// Heatmap fill at rate 1.
pub const HIGH_COLOR: Rgb = Rgb(0x67, 0x00, 0x0d);
/// Fill for cells without support.
pub const NO_DATA_COLOR: Rgb = Rgb(0xd9, 0xd9, 0xd9);
/// Bar fill.
pub const BAR_COLOR: Rgb = Rgb(0xcb, 0x18, 0x1d);

const FONT: &str = "sans-serif";

type DrawResult = Result<(), DrawingAreaErrorKind<std::io::Error>>;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Linear interpolation between two colours, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    /// `#rrggbb` notation.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn plot(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

/// Heatmap fill for a rate.
pub fn rate_color(rate: f64) -> Rgb {
    LOW_COLOR.lerp(HIGH_COLOR, rate)
}

/// Annotation colour readable on the fill of a cell with `rate`.
fn text_color(rate: Option<f64>) -> Rgb {
    match rate {
        Some(rate) if rate > 0.5 => Rgb(0xff, 0xff, 0xff),
        Some(_) => Rgb(0x00, 0x00, 0x00),
        None => Rgb(0x55, 0x55, 0x55),
    }
}

/// One bar of a bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub rate: f64,
    pub count: usize,
    /// Bar height as a fraction of the full axis (equals the rate).
    pub height: f64,
    /// Text drawn above the bar.
    pub annotation: String,
}

/// Attrition rate per value of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Rows with a value for the feature.
    pub total: usize,
    pub bars: Vec<Bar>,
}

/// Build a bar chart with one bar per group, in aggregation order.
pub fn bar_chart(aggregation: &SingleAggregation) -> BarChart {
    let feature = humanize(&aggregation.feature);

    let bars = aggregation
        .groups
        .iter()
        .map(|g| Bar {
            label: g.value.clone(),
            rate: g.rate,
            count: g.count,
            height: g.rate.clamp(0.0, 1.0),
            annotation: format!("{} (n={})", percent(g.rate), g.count),
        })
        .collect();

    BarChart {
        title: format!("Attrition Rate by {}", feature),
        x_label: feature,
        y_label: format!("{} Rate", humanize(&aggregation.outcome)),
        total: aggregation.total_count(),
        bars,
    }
}

/// One rendered heatmap cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatCell {
    /// `None` for cells without support.
    pub rate: Option<f64>,
    pub count: usize,
    pub fill: String,
    pub text_color: String,
    pub annotation: String,
}

/// Attrition rate over two features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub title: String,
    /// Feature on the column axis.
    pub x_label: String,
    /// Feature on the row axis.
    pub y_label: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<HeatCell>>,
}

/// Build a heatmap: rows are feature A values, columns feature B values.
pub fn heatmap(aggregation: &PairwiseAggregation) -> Heatmap {
    let a = humanize(&aggregation.feature_a);
    let b = humanize(&aggregation.feature_b);

    let cells = aggregation
        .cells
        .iter()
        .map(|row| row.iter().map(heat_cell).collect())
        .collect();

    Heatmap {
        title: format!("Attrition Heatmap: {} vs {}", a, b),
        x_label: b,
        y_label: a,
        rows: aggregation.rows.clone(),
        columns: aggregation.columns.clone(),
        cells,
    }
}

fn heat_cell(cell: &Cell) -> HeatCell {
    match cell {
        Cell::Observed { count, rate, .. } => HeatCell {
            rate: Some(*rate),
            count: *count,
            fill: rate_color(*rate).hex(),
            text_color: text_color(Some(*rate)).hex(),
            annotation: format!("{:.2}", rate),
        },
        Cell::NoData => HeatCell {
            rate: None,
            count: 0,
            fill: NO_DATA_COLOR.hex(),
            text_color: text_color(None).hex(),
            annotation: "no data".to_string(),
        },
    }
}

/// Escape text for inclusion in HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Draw onto an in-memory SVG document of `size` pixels.
fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String, RenderError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root).map_err(|e| RenderError(e.to_string()))?;
        root.present().map_err(|e| RenderError(e.to_string()))?;
    }
    Ok(svg)
}

/// Axis label for a segment centre; boundaries stay unlabelled.
fn segment_label(labels: &[String], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

impl BarChart {
    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> Result<String, RenderError> {
        let slots = self.bars.len().max(1) as u32;
        render_svg((140 + slots * 80, 420), |root| self.draw(root, slots))
    }

    fn draw(&self, root: &DrawingArea<SVGBackend<'_>, Shift>, slots: u32) -> DrawResult {
        root.fill(&WHITE)?;

        let labels: Vec<String> = self.bars.iter().map(|b| b.label.clone()).collect();
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 20))
            .margin(16)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..slots).into_segmented(), 0f64..1f64)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(slots as usize)
            .y_labels(5)
            .x_label_formatter(&|x| segment_label(&labels, x))
            .y_label_formatter(&|y| percent(*y))
            .x_desc(format!("{} (n={})", self.x_label, self.total))
            .y_desc(self.y_label.as_str())
            .draw()?;

        chart.draw_series(self.bars.iter().enumerate().map(|(i, bar)| {
            let i = i as u32;
            let mut rect = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), bar.height)],
                BAR_COLOR.plot().filled(),
            );
            rect.set_margin(0, 0, 12, 12);
            rect
        }))?;

        let above = (FONT, 12)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(self.bars.iter().enumerate().map(|(i, bar)| {
            Text::new(
                bar.annotation.clone(),
                (SegmentValue::CenterOf(i as u32), bar.height),
                above.clone(),
            )
        }))?;

        Ok(())
    }
}

impl Heatmap {
    /// Render as a standalone SVG document.
    ///
    /// Row 0 is drawn at the top. Cells without support use the
    /// [`NO_DATA_COLOR`] fill and read "no data".
    pub fn to_svg(&self) -> Result<String, RenderError> {
        let columns = self.columns.len().max(1) as u32;
        let rows = self.rows.len().max(1) as u32;
        render_svg((200 + columns * 90, 160 + rows * 50), |root| {
            self.draw(root, columns, rows)
        })
    }

    fn draw(&self, root: &DrawingArea<SVGBackend<'_>, Shift>, columns: u32, rows: u32) -> DrawResult {
        root.fill(&WHITE)?;

        // The y axis grows upwards, so row labels are read back to front.
        let row_labels: Vec<String> = self.rows.iter().rev().cloned().collect();
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 20))
            .margin(16)
            .x_label_area_size(60)
            .y_label_area_size(140)
            .build_cartesian_2d((0..columns).into_segmented(), (0..rows).into_segmented())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(columns as usize)
            .y_labels(rows as usize)
            .x_label_formatter(&|x| segment_label(&self.columns, x))
            .y_label_formatter(&|y| segment_label(&row_labels, y))
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .draw()?;

        let cells = self.cells.iter().enumerate().flat_map(|(r, row)| {
            let y = rows - 1 - r as u32;
            row.iter().enumerate().map(move |(c, cell)| (c as u32, y, cell))
        });

        chart.draw_series(cells.clone().map(|(c, y, cell)| {
            let fill = cell.rate.map_or(NO_DATA_COLOR, rate_color);
            Rectangle::new(
                [
                    (SegmentValue::Exact(c), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(c + 1), SegmentValue::Exact(y + 1)),
                ],
                fill.plot().filled(),
            )
        }))?;

        chart.draw_series(cells.map(|(c, y, cell)| {
            let style = (FONT, 13)
                .into_font()
                .color(&text_color(cell.rate).plot())
                .pos(Pos::new(HPos::Center, VPos::Center));
            Text::new(
                cell.annotation.clone(),
                (SegmentValue::CenterOf(c), SegmentValue::CenterOf(y)),
                style,
            )
        }))?;

        Ok(())
    }
}
