use std::collections::BTreeSet;
use std::fmt::Write;

use crate::chart;
use crate::error::DashboardError;
use crate::filter::{self, FilterSelection};
use crate::models::{FellowTable, Field};
use crate::summary::{self, Dimension, DimensionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Full(Dimension),
    Pair(Dimension, Dimension),
}

/// Page layout, top to bottom.
pub const LAYOUT: [Slot; 5] = [
    Slot::Full(Dimension::Milestone),
    Slot::Full(Dimension::Industry),
    Slot::Pair(Dimension::EnergyStyle, Dimension::Predictability),
    Slot::Full(Dimension::UserProfile),
    Slot::Pair(Dimension::Salary, Dimension::Gpa),
];

/// Everything one dashboard render needs.
pub struct Page<'a> {
    pub title: &'a str,
    pub full: &'a FellowTable,
    pub filtered: &'a FellowTable,
    pub selection: &'a FilterSelection,
    /// Emit the filter form; static snapshots list the selection instead.
    pub interactive: bool,
}

pub fn render_page(page: &Page<'_>) -> Result<String, DashboardError> {
    let summaries = summary::summarize_all(page.filtered);
    let mut body = String::new();

    for slot in LAYOUT {
        match slot {
            Slot::Full(dimension) => {
                let _ = writeln!(
                    body,
                    "<section class=\"row\"><div class=\"panel full\">{}</div></section>",
                    render_panel(&summaries[dimension.index()], 3)?
                );
            }
            Slot::Pair(left, right) => {
                let _ = writeln!(
                    body,
                    "<section class=\"row\"><div class=\"panel half\">{}</div><div class=\"panel half\">{}</div></section>",
                    render_panel(&summaries[left.index()], 4)?,
                    render_panel(&summaries[right.index()], 4)?
                );
            }
        }
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <aside class="sidebar">{sidebar}</aside>
    <main>
        <h1>{title}</h1>
        <p class="meta">Snapshot taken {fetched} &middot; showing {shown} of {total} fellows</p>
{body}    </main>
</body>
</html>
"#,
        title = html_escape(page.title),
        css = inline_css(),
        sidebar = render_sidebar(page),
        fetched = page.full.fetched_at.format("%Y-%m-%d %H:%M UTC"),
        shown = page.filtered.rows.len(),
        total = page.full.rows.len(),
        body = body,
    ))
}

fn render_panel(summary: &DimensionSummary, heading: u8) -> Result<String, DashboardError> {
    Ok(format!(
        "<h{heading}>{}</h{heading}>{}",
        html_escape(summary.title),
        chart::render_chart(summary.dimension, &summary.rows)?
    ))
}

fn render_sidebar(page: &Page<'_>) -> String {
    let colleges = filter::distinct_values(page.full, Field::College);
    let dates = filter::distinct_values(page.full, Field::GraduationDate);
    let mut out = String::new();
    let _ = writeln!(out, "<h2>Filter by College and Grad Date here</h2>");

    if page.interactive {
        let _ = writeln!(out, "<form method=\"get\" action=\"/\">");
        let _ = writeln!(out, "<input type=\"hidden\" name=\"applied\" value=\"1\">");
        out.push_str(&render_multiselect(
            "college",
            "Select the College:",
            &colleges,
            &page.selection.colleges,
        ));
        out.push_str(&render_multiselect(
            "grad_date",
            "Select the Graduation Date:",
            &dates,
            &page.selection.graduation_dates,
        ));
        let _ = writeln!(out, "<button type=\"submit\">Apply</button>");
        let _ = writeln!(out, "</form>");
    } else {
        out.push_str(&render_selected_list("Colleges", &colleges, &page.selection.colleges));
        out.push_str(&render_selected_list(
            "Graduation Dates",
            &dates,
            &page.selection.graduation_dates,
        ));
    }

    out
}

fn render_multiselect(
    name: &str,
    label: &str,
    options: &[Option<String>],
    selected: &BTreeSet<Option<String>>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<label for=\"{name}\">{}</label>", html_escape(label));
    let _ = writeln!(
        out,
        "<select multiple id=\"{name}\" name=\"{name}\" size=\"{}\">",
        options.len().clamp(2, 12)
    );
    for option in options {
        let marker = if selected.contains(option) { " selected" } else { "" };
        let _ = writeln!(
            out,
            "<option value=\"{}\"{marker}>{}</option>",
            html_escape(&filter::option_token(option.as_deref())),
            html_escape(&display_option(option.as_deref()))
        );
    }
    let _ = writeln!(out, "</select>");
    out
}

fn render_selected_list(
    heading: &str,
    options: &[Option<String>],
    selected: &BTreeSet<Option<String>>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<h3>{}</h3><ul>", html_escape(heading));
    for option in options.iter().filter(|o| selected.contains(*o)) {
        let _ = writeln!(out, "<li>{}</li>", html_escape(&display_option(option.as_deref())));
    }
    let _ = writeln!(out, "</ul>");
    out
}

fn display_option(value: Option<&str>) -> String {
    value.unwrap_or("(blank)").to_string()
}

/// Page shown when a render pass fails.
pub fn render_error_page(title: &str, error: &DashboardError) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <main>
        <h1>{title}</h1>
        <div class="error">
            <h2>The dashboard could not be rendered</h2>
            <pre>{message}</pre>
            <p>Reload the page to try again.</p>
        </div>
    </main>
</body>
</html>
"#,
        title = html_escape(title),
        css = inline_css(),
        message = html_escape(&error.to_string()),
    )
}

/// Markdown rendition of the seven count tables.
pub fn build_text_summary(title: &str, shown: usize, total: usize, summaries: &[DimensionSummary]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {title}");
    let _ = writeln!(output, "Showing {shown} of {total} fellows");

    for summary in summaries {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", summary.title);
        if summary.rows.is_empty() {
            let _ = writeln!(output, "No fellows match the current filters.");
            continue;
        }
        for row in &summary.rows {
            let _ = writeln!(output, "- {}: {}", row.label, row.count);
        }
    }

    output
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; }
body {
    margin: 0;
    display: flex;
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    color: #111827;
    background: #ffffff;
}
.sidebar {
    width: 280px;
    min-height: 100vh;
    padding: 1.5rem 1rem;
    background: #f3f4f6;
    border-right: 1px solid #e5e7eb;
}
.sidebar h2 { font-size: 1rem; }
.sidebar label { display: block; margin: 1rem 0 0.25rem; font-weight: 600; }
.sidebar select { width: 100%; }
.sidebar button { margin-top: 1rem; padding: 0.4rem 1rem; }
main { flex: 1; padding: 2rem; max-width: 1400px; }
.meta { color: #6b7280; font-size: 0.875rem; }
.row { display: flex; gap: 2rem; margin-bottom: 2rem; }
.panel.full { flex: 1 1 100%; }
.panel.half { flex: 1 1 50%; }
.panel svg { max-width: 100%; height: auto; }
.empty { color: #6b7280; font-style: italic; }
.error { border: 1px solid #fca5a5; background: #fef2f2; padding: 1rem 1.5rem; }
"#
}
