//! HTML rendering of a report
//!
//! Produces one self-contained document: embedded CSS, a section per sheet,
//! and bar charts drawn as inline SVG from each sheet's chart spec.

use crate::pipeline::SkipSummary;
use crate::report::{Cell, ChartSpec, ReportModel, Sheet, Table};
use std::collections::HashMap;

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 360.0;
const CHART_MARGIN_LEFT: f64 = 70.0;
const CHART_MARGIN_TOP: f64 = 40.0;
const CHART_MARGIN_BOTTOM: f64 = 130.0;

/// HTML report formatter
#[derive(Debug)]
pub struct HtmlOutput<'a> {
    model: &'a ReportModel,
    skipped: Option<&'a SkipSummary>,
    /// Sheet name to anchor id
    anchors: HashMap<&'a str, String>,
}

impl<'a> HtmlOutput<'a> {
    pub fn new(model: &'a ReportModel) -> Self {
        let anchors = model
            .sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| (sheet.name(), format!("sheet-{}", i + 1)))
            .collect();

        Self {
            model,
            skipped: None,
            anchors,
        }
    }

    /// Append a note about rejected input rows
    pub fn with_skip_summary(mut self, summary: &'a SkipSummary) -> Self {
        self.skipped = Some(summary);
        self
    }

    /// Escape HTML special characters to prevent XSS
    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    /// Generate embedded CSS styles
    fn generate_styles() -> &'static str {
        r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            background-color: #f5f5f5;
        }
        h1, h2, h3 {
            color: #333;
        }
        nav a {
            margin-right: 12px;
        }
        section.sheet {
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            padding: 16px;
            margin-bottom: 24px;
        }
        table {
            border-collapse: collapse;
            width: 100%;
            margin-bottom: 20px;
        }
        th, td {
            border: 1px solid #ddd;
            padding: 8px;
            text-align: left;
        }
        th {
            background-color: #4a90d9;
            color: white;
            font-weight: bold;
        }
        tr:nth-child(even) {
            background-color: #f9f9f9;
        }
        td.number {
            font-family: monospace;
            text-align: right;
        }
        .charts svg {
            margin-right: 20px;
            background-color: #fff;
        }
        .bar {
            fill: #4a90d9;
        }
        .empty {
            color: #888;
            font-style: italic;
        }
        .skipped {
            color: #cc0000;
        }
        .footer {
            margin-top: 20px;
            font-size: 0.8em;
            color: #888;
            text-align: center;
        }
        "#
    }

    fn format_cell(&self, cell: &Cell) -> String {
        match cell {
            Cell::Text(text) => format!("<td>{}</td>", Self::escape_html(text)),
            Cell::Number(_) | Cell::Integer(_) => {
                format!(r#"<td class="number">{}</td>"#, cell.display())
            }
            Cell::Link { text, sheet } => match self.anchors.get(sheet.as_str()) {
                Some(anchor) => format!(
                    r##"<td><a href="#{}">{}</a></td>"##,
                    anchor,
                    Self::escape_html(text)
                ),
                None => format!("<td>{}</td>", Self::escape_html(text)),
            },
        }
    }

    fn render_table(&self, table: &Table) -> String {
        let mut html = String::new();
        html.push_str(&format!("        <h3>{}</h3>\n", Self::escape_html(&table.title)));

        if table.rows.is_empty() {
            html.push_str("        <p class=\"empty\">No entries</p>\n");
            return html;
        }

        html.push_str("        <table>\n");
        let header: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("<th>{}</th>", Self::escape_html(c)))
            .collect();
        html.push_str(&format!("            <tr>{}</tr>\n", header.join("")));

        for row in &table.rows {
            let cells: Vec<String> = row.iter().map(|c| self.format_cell(c)).collect();
            html.push_str(&format!("            <tr>{}</tr>\n", cells.join("")));
        }

        html.push_str("        </table>\n");
        html
    }

    /// Draw a bar chart as inline SVG
    fn render_chart(chart: &ChartSpec) -> String {
        let plot_width = CHART_WIDTH - CHART_MARGIN_LEFT - 20.0;
        let plot_height = CHART_HEIGHT - CHART_MARGIN_TOP - CHART_MARGIN_BOTTOM;
        let baseline = CHART_MARGIN_TOP + plot_height;
        let max = chart.values.iter().copied().fold(0.0_f64, f64::max);

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img">"#,
            w = CHART_WIDTH,
            h = CHART_HEIGHT
        );
        svg.push_str(&format!(
            r#"<text x="{}" y="20" text-anchor="middle" font-weight="bold">{}</text>"#,
            CHART_WIDTH / 2.0,
            Self::escape_html(&chart.title)
        ));
        svg.push_str(&format!(
            r##"<line x1="{x}" y1="{top}" x2="{x}" y2="{b}" stroke="#333"/><line x1="{x}" y1="{b}" x2="{r}" y2="{b}" stroke="#333"/>"##,
            x = CHART_MARGIN_LEFT,
            top = CHART_MARGIN_TOP,
            b = baseline,
            r = CHART_MARGIN_LEFT + plot_width
        ));
        svg.push_str(&format!(
            r#"<text x="15" y="{}" transform="rotate(-90 15 {})" text-anchor="middle">{}</text>"#,
            baseline - plot_height / 2.0,
            baseline - plot_height / 2.0,
            Self::escape_html(&chart.y_label)
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
            CHART_MARGIN_LEFT + plot_width / 2.0,
            CHART_HEIGHT - 8.0,
            Self::escape_html(&chart.x_label)
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{}</text>"#,
            CHART_MARGIN_LEFT - 6.0,
            CHART_MARGIN_TOP + 4.0,
            max
        ));

        if !chart.values.is_empty() {
            let slot = plot_width / chart.values.len() as f64;
            let bar_width = slot * 0.7;

            for (i, (label, value)) in chart.categories.iter().zip(&chart.values).enumerate() {
                let height = if max > 0.0 {
                    value / max * plot_height
                } else {
                    0.0
                };
                let x = CHART_MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
                let label_x = x + bar_width / 2.0;

                svg.push_str(&format!(
                    r#"<rect class="bar" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"><title>{}: {}</title></rect>"#,
                    x,
                    baseline - height,
                    bar_width,
                    height,
                    Self::escape_html(label),
                    value
                ));
                svg.push_str(&format!(
                    r#"<text x="{lx:.1}" y="{ly:.1}" transform="rotate(-30 {lx:.1} {ly:.1})" text-anchor="end" font-size="11">{}</text>"#,
                    Self::escape_html(label),
                    lx = label_x,
                    ly = baseline + 14.0
                ));
            }
        }

        svg.push_str("</svg>");
        svg
    }

    fn render_sheet(&self, sheet: &Sheet) -> String {
        let anchor = self
            .anchors
            .get(sheet.name())
            .cloned()
            .unwrap_or_default();

        let mut html = format!(
            "    <section class=\"sheet\" id=\"{}\" style=\"zoom: {}%\">\n",
            anchor, self.model.display_zoom
        );
        html.push_str(&format!("        <h2>{}</h2>\n", Self::escape_html(sheet.name())));

        match sheet {
            Sheet::Machine(machine) => {
                if machine.name != machine.machine {
                    html.push_str(&format!(
                        "        <p>Machine: {}</p>\n",
                        Self::escape_html(&machine.machine)
                    ));
                }
                for table in machine.tables() {
                    html.push_str(&self.render_table(&table));
                }
                html.push_str("        <div class=\"charts\">\n");
                for chart in &machine.charts {
                    html.push_str("            ");
                    html.push_str(&Self::render_chart(chart));
                    html.push('\n');
                }
                html.push_str("        </div>\n");
            }
            Sheet::Summary(summary) => html.push_str(&self.render_table(&summary.table)),
        }

        html.push_str("    </section>\n");
        html
    }

    /// Generate complete HTML document
    pub fn to_html(&self) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");

        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str("    <title>Fault Report</title>\n");
        html.push_str("    <style>");
        html.push_str(Self::generate_styles());
        html.push_str("</style>\n");
        html.push_str("</head>\n");

        html.push_str("<body>\n");
        html.push_str("    <h1>Fault Report</h1>\n");

        // active sheet leads the navigation
        html.push_str("    <nav>\n");
        let active = self.model.sheet(&self.model.active_sheet);
        let nav_order = active
            .into_iter()
            .chain(self.model.sheets.iter().filter(|s| Some(*s) != active));
        for sheet in nav_order {
            if let Some(anchor) = self.anchors.get(sheet.name()) {
                html.push_str(&format!(
                    "        <a href=\"#{}\">{}</a>\n",
                    anchor,
                    Self::escape_html(sheet.name())
                ));
            }
        }
        html.push_str("    </nav>\n");

        if let Some(skipped) = self.skipped.filter(|s| s.total > 0) {
            let reasons: Vec<String> = skipped
                .by_reason
                .iter()
                .map(|(reason, count)| format!("{}: {}", reason, count))
                .collect();
            html.push_str(&format!(
                "    <p class=\"skipped\">{} input rows skipped ({})</p>\n",
                skipped.total,
                Self::escape_html(&reasons.join(", "))
            ));
        }

        for sheet in &self.model.sheets {
            html.push_str(&self.render_sheet(sheet));
        }

        html.push_str("    <div class=\"footer\">\n");
        html.push_str("        Generated by faultrank\n");
        html.push_str("    </div>\n");

        html.push_str("</body>\n");
        html.push_str("</html>\n");

        html
    }
}
