//! Server-rendered dashboard page.
//!
//! Three tabs share one HTML shell. Selectors are plain GET forms that
//! resubmit on change, so every selection reaches the server as a new
//! request and the page never needs client-side scripting beyond that.

use super::chart::escape;
use crate::error::RenderError;
use crate::models::{humanize, percent};
use crate::report::{describe_profile, ExecutiveSummary};
use crate::session::{DriverView, HeatmapView};
use serde::Deserialize;

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;margin:0;color:#222}\
header{background:#67000d;color:#fff;padding:14px 24px}\
header h1{margin:0;font-size:22px}\
nav{display:flex;gap:4px;padding:0 24px;border-bottom:1px solid #ddd}\
nav a{padding:10px 16px;text-decoration:none;color:#444}\
nav a.active{border-bottom:3px solid #cb181d;color:#000;font-weight:bold}\
main{padding:16px 24px}\
select{font-size:16px;min-height:36px;margin-right:12px}\
label{font-weight:600;margin-right:6px}\
table{border-collapse:collapse;margin:8px 0}\
td,th{border:1px solid #ddd;padding:6px 10px;text-align:left}\
.error{background:#fdecea;border:1px solid #cb181d;color:#67000d;padding:10px;margin:12px 0}\
.info{background:#eef4fb;border:1px solid #9ecae1;padding:10px;margin:12px 0}";

/// Dashboard tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Drivers,
    Heatmap,
    Summary,
}

impl Tab {
    fn slug(self) -> &'static str {
        match self {
            Tab::Drivers => "drivers",
            Tab::Heatmap => "heatmap",
            Tab::Summary => "summary",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Tab::Drivers => "Attrition Driver Explorer",
            Tab::Heatmap => "Heatmap Laboratory",
            Tab::Summary => "Executive Summary",
        }
    }
}

/// Everything shown on one page render.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub tab: Tab,
    /// Selector options.
    pub features: &'a [String],
    pub driver: Option<&'a DriverView>,
    pub heatmap: Option<&'a HeatmapView>,
    /// Inline error from the last input cycle.
    pub error: Option<&'a str>,
    pub summary: &'a ExecutiveSummary,
}

/// Render the full HTML document.
pub fn render_page(page: &Page) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>HR Attrition Analytics</title>\n");
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    html.push_str("<header><h1>HR Attrition Analytics</h1></header>\n");

    html.push_str("<nav>");
    for tab in [Tab::Drivers, Tab::Heatmap, Tab::Summary] {
        let class = if tab == page.tab { " class=\"active\"" } else { "" };
        html.push_str(&format!(
            "<a href=\"/?tab={}\"{}>{}</a>",
            tab.slug(),
            class,
            tab.title()
        ));
    }
    html.push_str("</nav>\n<main>\n");

    html.push_str(&format!("<h2>{}</h2>\n", page.tab.title()));

    if let Some(error) = page.error {
        html.push_str(&format!("<div class=\"error\">{}</div>\n", escape(error)));
    }

    match page.tab {
        Tab::Drivers => html.push_str(&drivers_tab(page.features, page.driver)),
        Tab::Heatmap => html.push_str(&heatmap_tab(page.features, page.heatmap)),
        Tab::Summary => html.push_str(&summary_tab(page.summary)),
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn select(name: &str, label: &str, options: &[String], selected: Option<&str>) -> String {
    let mut html = format!(
        "<label for=\"{name}\">{}</label><select id=\"{name}\" name=\"{name}\" onchange=\"this.form.submit()\">",
        escape(label)
    );
    for option in options {
        let marker = if Some(option.as_str()) == selected { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            escape(option),
            marker,
            escape(&humanize(option))
        ));
    }
    html.push_str("</select>");
    html
}

fn drivers_tab(features: &[String], view: Option<&DriverView>) -> String {
    let mut html = String::new();

    html.push_str(
        "<p>Select a driver to understand <b>how it contributes to attrition</b>, \
         and which combinations make it more dangerous.</p>\n",
    );
    html.push_str("<form method=\"get\" action=\"/\"><input type=\"hidden\" name=\"tab\" value=\"drivers\">");
    html.push_str(&select(
        "feature",
        "Select Attrition Driver",
        features,
        view.map(|v| v.feature.as_str()),
    ));
    html.push_str("</form>\n");

    let Some(view) = view else {
        html.push_str("<div class=\"info\">Select a driver to begin.</div>\n");
        return html;
    };

    html.push_str("<h3>Attrition Rate by Driver Values</h3>\n");
    html.push_str(&figure(view.chart.to_svg()));

    html.push_str("<h3>Top Risk Combinations Involving This Driver</h3>\n");
    if view.combinations.is_empty() {
        html.push_str("<div class=\"info\">No combination has enough employees to rank.</div>\n");
        return html;
    }

    html.push_str("<table><tr><th>Combination</th><th>Attrition Rate</th><th>Employees</th></tr>\n");
    for combo in &view.combinations {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&describe_profile(combo)),
            percent(combo.rate),
            combo.support
        ));
    }
    html.push_str("</table>\n");

    html
}

fn heatmap_tab(features: &[String], view: Option<&HeatmapView>) -> String {
    let mut html = String::new();

    html.push_str(
        "<p>Explore <b>any pairwise interaction</b> to understand how two factors \
         together influence attrition.</p>\n",
    );
    html.push_str("<form method=\"get\" action=\"/\"><input type=\"hidden\" name=\"tab\" value=\"heatmap\">");
    html.push_str(&select("a", "Feature 1", features, view.map(|v| v.feature_a.as_str())));
    html.push_str(&select("b", "Feature 2", features, view.map(|v| v.feature_b.as_str())));
    html.push_str("</form>\n");

    match view {
        Some(view) if view.aggregation.rows.is_empty() || view.aggregation.columns.is_empty() => {
            html.push_str("<div class=\"info\">No data available for this combination.</div>\n")
        }
        Some(view) => html.push_str(&figure(view.chart.to_svg())),
        None => html.push_str("<div class=\"info\">Select two features to begin.</div>\n"),
    }

    html
}

fn figure(svg: Result<String, RenderError>) -> String {
    match svg {
        Ok(svg) => svg,
        Err(e) => format!("<div class=\"error\">{}</div>\n", escape(&e.to_string())),
    }
}

fn summary_tab(summary: &ExecutiveSummary) -> String {
    let mut html = String::new();
    let overview = &summary.overview;

    html.push_str(&format!(
        "<p>{} employees, {} of whom left ({}).</p>\n",
        overview.total_employees,
        overview.attrition_count,
        percent(overview.attrition_rate)
    ));

    html.push_str("<h3>Top Attrition Drivers</h3>\n");
    if summary.key_drivers.is_empty() {
        html.push_str(&format!(
            "<div class=\"info\">No feature value is shared by at least {} employees.</div>\n",
            summary.min_support
        ));
    } else {
        html.push_str("<ol>\n");
        for driver in &summary.key_drivers {
            html.push_str(&format!(
                "<li><b>{} = {}</b>: {} attrition (n={})</li>\n",
                escape(&humanize(&driver.feature)),
                escape(&driver.value),
                percent(driver.rate),
                driver.support
            ));
        }
        html.push_str("</ol>\n");
    }

    html.push_str("<h3>High-Risk Employee Profiles</h3>\n");
    if summary.risk_profiles.is_empty() {
        html.push_str(&format!(
            "<div class=\"info\">No feature combination is shared by at least {} employees.</div>\n",
            summary.min_support
        ));
    } else {
        html.push_str("<ul>\n");
        for profile in &summary.risk_profiles {
            html.push_str(&format!(
                "<li>Employees with <b>{} = {}</b> and <b>{} = {}</b> show attrition rate of <b>{}</b> (n={})</li>\n",
                escape(&humanize(&profile.feature_1)),
                escape(&profile.value_1),
                escape(&humanize(&profile.feature_2)),
                escape(&profile.value_2),
                percent(profile.rate),
                profile.support
            ));
        }
        html.push_str("</ul>\n");
    }

    if !summary.recommendations.is_empty() {
        html.push_str(&format!(
            "<h3>What {} Can Do to Reduce Attrition</h3>\n",
            escape(&summary.organisation)
        ));
        for (i, rec) in summary.recommendations.iter().enumerate() {
            html.push_str(&format!("<h4>{}. {}</h4>\n<ul>\n", i + 1, escape(&rec.title)));
            for action in &rec.actions {
                html.push_str(&format!("<li>{}</li>\n", escape(action)));
            }
            html.push_str("</ul>\n");
        }
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummaryConfig;
    use crate::dataset::tests::{dataset, overtime_dataset};
    use crate::session::tests::overtime_session;
    use crate::session::InputEvent;

    fn summary() -> ExecutiveSummary {
        let ds = overtime_dataset();
        let settings = SummaryConfig {
            min_support: 1,
            ..SummaryConfig::default()
        };
        ExecutiveSummary::generate(&ds, ds.feature_columns(), "Attrition", &settings).unwrap()
    }

    fn features() -> Vec<String> {
        vec!["Department".to_string(), "OverTime".to_string()]
    }

    #[test]
    fn test_idle_drivers_tab() {
        let summary = summary();
        let features = features();
        let html = render_page(&Page {
            tab: Tab::Drivers,
            features: &features,
            driver: None,
            heatmap: None,
            error: None,
            summary: &summary,
        });

        assert!(html.contains("<a href=\"/?tab=drivers\" class=\"active\">"));
        assert!(html.contains("onchange=\"this.form.submit()\""));
        assert!(html.contains("Select a driver to begin."));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_rendered_driver_tab_keeps_selection() {
        let (mut session, _file) = overtime_session();
        session.handle(InputEvent::SelectDriver("OverTime".to_string())).unwrap();
        let summary = summary();
        let features = features();

        let html = render_page(&Page {
            tab: Tab::Drivers,
            features: &features,
            driver: session.driver_view(),
            heatmap: None,
            error: Some("unknown column '<Tenure>'"),
            summary: &summary,
        });

        assert!(html.contains("<option value=\"OverTime\" selected>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("Department = Sales"));
        assert!(html.contains("<div class=\"error\">unknown column &#39;&lt;Tenure&gt;&#39;</div>"));
    }

    #[test]
    fn test_heatmap_tab() {
        let (mut session, _file) = overtime_session();
        session
            .handle(InputEvent::SelectPair("OverTime".to_string(), "Department".to_string()))
            .unwrap();
        let summary = summary();
        let features = features();

        let html = render_page(&Page {
            tab: Tab::Heatmap,
            features: &features,
            driver: None,
            heatmap: session.heatmap_view(),
            error: None,
            summary: &summary,
        });

        assert!(html.contains("Attrition Heatmap: Overtime vs Department"));
        assert!(html.contains("<select id=\"b\" name=\"b\""));
    }

    #[test]
    fn test_heatmap_without_columns_shows_no_data() {
        let ds = dataset(
            &["OverTime", "Notes", "Attrition"],
            &[&["Yes", "", "Yes"], &["No", "", "No"]],
        );
        let view = HeatmapView::build(&ds, "OverTime", "Notes").unwrap();
        assert_eq!(view.aggregation.rows.len(), 2);
        assert!(view.aggregation.columns.is_empty());

        let summary = summary();
        let features = features();
        let html = render_page(&Page {
            tab: Tab::Heatmap,
            features: &features,
            driver: None,
            heatmap: Some(&view),
            error: None,
            summary: &summary,
        });

        assert!(html.contains("No data available for this combination."));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_summary_tab() {
        let summary = summary();
        let features = features();
        let html = render_page(&Page {
            tab: Tab::Summary,
            features: &features,
            driver: None,
            heatmap: None,
            error: None,
            summary: &summary,
        });

        assert!(html.contains("<h3>Top Attrition Drivers</h3>"));
        assert!(html.contains("Employees with <b>Department = Sales</b> and <b>Overtime = No</b>"));
        assert!(html.contains("What ACME Can Do to Reduce Attrition"));
        assert!(html.contains("Compensation &amp; Commute Considerations"));
    }
}
