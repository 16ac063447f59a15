//! Bar charts drawn with plotters onto an in-memory SVG.
//!
//! plotters emits no hover text, so each bar gets a transparent overlay
//! carrying a `<title>` once the chart has been drawn.

use std::fmt::Write;

use plotters::prelude::*;

use crate::error::DashboardError;
use crate::models::CountRow;
use crate::summary::Dimension;

/// Qualitative palette for categories without a fixed colour.
pub const PALETTE: &[&str] = &[
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

const HORIZONTAL_WIDTH: u32 = 900;
const VERTICAL_WIDTH: u32 = 560;
const VERTICAL_HEIGHT: u32 = 420;
const ROW_HEIGHT: u32 = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

pub fn orientation(dimension: Dimension) -> Orientation {
    match dimension {
        Dimension::Milestone | Dimension::Industry => Orientation::Horizontal,
        _ => Orientation::Vertical,
    }
}

fn milestone_color(label: &str) -> Option<&'static str> {
    match label {
        "Clarity" => Some("#00A3E1"),
        "Alignment" => Some("#85C540"),
        "Search Strategy" => Some("#D04D9D"),
        "Interviewing & Advancing" => Some("#FFC507"),
        _ => None,
    }
}

/// Bar colour for the category at `position` in its chart.
pub fn bar_color(dimension: Dimension, label: &str, position: usize) -> &'static str {
    let fixed = match dimension {
        Dimension::Milestone => milestone_color(label),
        _ => None,
    };
    fixed.unwrap_or(PALETTE[position % PALETTE.len()])
}

fn rgb(hex: &str) -> RGBColor {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0);
    RGBColor((value >> 16) as u8, (value >> 8) as u8, value as u8)
}

fn chart_error(err: impl std::fmt::Display) -> DashboardError {
    DashboardError::ChartRender(err.to_string())
}

/// Pixel box of one drawn bar plus its hover text.
struct Tooltip {
    from: (i32, i32),
    to: (i32, i32),
    text: String,
}

/// Renders one bar chart as SVG markup, or a placeholder when nothing is
/// left to count.
pub fn render_chart(dimension: Dimension, rows: &[CountRow]) -> Result<String, DashboardError> {
    if rows.is_empty() {
        return Ok("<p class=\"empty\">No fellows match the current filters.</p>".to_string());
    }
    let (svg, tooltips) = match orientation(dimension) {
        Orientation::Horizontal => draw_horizontal(dimension, rows)?,
        Orientation::Vertical => draw_vertical(dimension, rows)?,
    };
    Ok(with_tooltips(svg, &tooltips))
}

fn count_axis_end(rows: &[CountRow]) -> i32 {
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0).max(1) as i32;
    max + max / 10 + 1
}

fn draw_horizontal(
    dimension: Dimension,
    rows: &[CountRow],
) -> Result<(String, Vec<Tooltip>), DashboardError> {
    let slots = rows.len() as i32;
    let height = 90 + ROW_HEIGHT * rows.len() as u32;
    // First category on top: row `i` sits in slot `slots - 1 - i`.
    let label_of = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(slot) => usize::try_from(slots - 1 - slot)
            .ok()
            .and_then(|index| rows.get(index))
            .map(|row| row.label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };

    let mut svg = String::new();
    let mut tooltips = Vec::with_capacity(rows.len());
    {
        let root =
            SVGBackend::with_string(&mut svg, (HORIZONTAL_WIDTH, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .x_label_area_size(44)
            .y_label_area_size(230)
            .build_cartesian_2d(0..count_axis_end(rows), (0..slots).into_segmented())
            .map_err(chart_error)?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(rows.len())
            .y_label_formatter(&label_of)
            .x_desc("Number of Fellows")
            .y_desc(dimension.axis_label())
            .draw()
            .map_err(chart_error)?;

        for (index, row) in rows.iter().enumerate() {
            let slot = slots - 1 - index as i32;
            let count = row.count as i32;
            let from = (0, SegmentValue::Exact(slot));
            let to = (count, SegmentValue::Exact(slot + 1));
            let mut bar = Rectangle::new(
                [from.clone(), to.clone()],
                rgb(bar_color(dimension, &row.label, index)).filled(),
            );
            bar.set_margin(5, 5, 0, 0);
            chart.draw_series(std::iter::once(bar)).map_err(chart_error)?;
            tooltips.push(Tooltip {
                from: chart.backend_coord(&from),
                to: chart.backend_coord(&to),
                text: format!("{}: {}", row.label, row.count),
            });
        }
        root.present().map_err(chart_error)?;
    }

    Ok((svg, tooltips))
}

fn draw_vertical(
    dimension: Dimension,
    rows: &[CountRow],
) -> Result<(String, Vec<Tooltip>), DashboardError> {
    let slots = rows.len() as i32;
    let label_of = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(slot) => usize::try_from(*slot)
            .ok()
            .and_then(|index| rows.get(index))
            .map(|row| row.label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };

    let mut svg = String::new();
    let mut tooltips = Vec::with_capacity(rows.len());
    {
        let root = SVGBackend::with_string(&mut svg, (VERTICAL_WIDTH, VERTICAL_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .x_label_area_size(70)
            .y_label_area_size(50)
            .build_cartesian_2d((0..slots).into_segmented(), 0..count_axis_end(rows))
            .map_err(chart_error)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(rows.len())
            .x_label_formatter(&label_of)
            .x_desc(dimension.axis_label())
            .y_desc("Number of Fellows")
            .draw()
            .map_err(chart_error)?;

        for (index, row) in rows.iter().enumerate() {
            let slot = index as i32;
            let count = row.count as i32;
            let from = (SegmentValue::Exact(slot), 0);
            let to = (SegmentValue::Exact(slot + 1), count);
            let mut bar = Rectangle::new(
                [from.clone(), to.clone()],
                rgb(bar_color(dimension, &row.label, index)).filled(),
            );
            bar.set_margin(0, 0, 8, 8);
            chart.draw_series(std::iter::once(bar)).map_err(chart_error)?;
            tooltips.push(Tooltip {
                from: chart.backend_coord(&from),
                to: chart.backend_coord(&to),
                text: format!("{}: {}", row.label, row.count),
            });
        }
        root.present().map_err(chart_error)?;
    }

    Ok((svg, tooltips))
}

fn with_tooltips(mut svg: String, tooltips: &[Tooltip]) -> String {
    let mut overlay = String::from("<g class=\"tooltips\">\n");
    for tooltip in tooltips {
        let x = tooltip.from.0.min(tooltip.to.0);
        let y = tooltip.from.1.min(tooltip.to.1);
        let width = (tooltip.to.0 - tooltip.from.0).abs();
        let height = (tooltip.to.1 - tooltip.from.1).abs();
        let _ = writeln!(
            overlay,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" fill=\"#000000\" fill-opacity=\"0\"><title>{}</title></rect>",
            escape_xml(&tooltip.text)
        );
    }
    overlay.push_str("</g>\n");

    match svg.rfind("</svg>") {
        Some(end) => svg.insert_str(end, &overlay),
        None => svg.push_str(&overlay),
    }
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
