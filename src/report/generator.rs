//! Markdown and JSON rendering of the executive summary.

use super::ExecutiveSummary;
use crate::config::Recommendation;
use crate::models::{humanize, percent, Combination, Driver};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate the complete Markdown summary.
pub fn generate_markdown_summary(summary: &ExecutiveSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# Executive Summary: {} Drivers\n\n",
        humanize(&summary.outcome)
    ));

    output.push_str(&generate_overview_section(summary));
    output.push_str(&generate_drivers_section(&summary.key_drivers, summary.min_support));
    output.push_str(&generate_profiles_section(&summary.risk_profiles, summary.min_support));
    output.push_str(&generate_recommendations_section(
        &summary.organisation,
        &summary.recommendations,
    ));
    output.push_str(&generate_footer());

    output
}

fn generate_overview_section(summary: &ExecutiveSummary) -> String {
    let overview = &summary.overview;
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", overview.dataset));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        overview.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Employees:** {}\n", overview.total_employees));
    section.push_str(&format!(
        "- **{}:** {} ({})\n",
        humanize(&summary.outcome),
        overview.attrition_count,
        percent(overview.attrition_rate)
    ));
    section.push_str(&format!(
        "- **Features Analyzed:** {}\n\n",
        overview.features_analyzed
    ));

    section
}

fn generate_drivers_section(drivers: &[Driver], min_support: usize) -> String {
    let mut section = String::new();

    section.push_str("## Key Drivers\n\n");

    if drivers.is_empty() {
        section.push_str(&format!(
            "No feature value is shared by at least {} employees.\n\n",
            min_support
        ));
        return section;
    }

    section.push_str("| Rank | Feature | Highest-Risk Value | Attrition Rate | Employees |\n");
    section.push_str("|:---:|:---|:---|:---:|:---:|\n");
    for (i, driver) in drivers.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            i + 1,
            table_cell(&humanize(&driver.feature)),
            table_cell(&driver.value),
            percent(driver.rate),
            driver.support
        ));
    }
    section.push('\n');

    if let Some(top) = drivers.first() {
        section.push_str(&format!(
            "> Employees with **{} = {}** leave at a rate of **{}**.\n\n",
            humanize(&top.feature),
            top.value,
            percent(top.rate)
        ));
    }

    section
}

fn generate_profiles_section(profiles: &[Combination], min_support: usize) -> String {
    let mut section = String::new();

    section.push_str("## High-Risk Profiles\n\n");

    if profiles.is_empty() {
        section.push_str(&format!(
            "No feature combination is shared by at least {} employees.\n\n",
            min_support
        ));
        return section;
    }

    section.push_str("| Rank | Profile | Attrition Rate | Employees |\n");
    section.push_str("|:---:|:---|:---:|:---:|\n");
    for (i, profile) in profiles.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            i + 1,
            table_cell(&describe_profile(profile)),
            percent(profile.rate),
            profile.support
        ));
    }
    section.push('\n');

    section
}

/// Escape a value for a Markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// `Overtime = Yes, Department = Sales`.
pub fn describe_profile(profile: &Combination) -> String {
    format!(
        "{} = {}, {} = {}",
        humanize(&profile.feature_1),
        profile.value_1,
        humanize(&profile.feature_2),
        profile.value_2
    )
}

fn generate_recommendations_section(organisation: &str, recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!("## Recommendations for {}\n\n", organisation));

    for rec in recommendations {
        section.push_str(&format!("### {}\n\n", rec.title));
        for action in &rec.actions {
            section.push_str(&format!("- {}\n", action));
        }
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Summary generated by Attrition Explorer v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate the JSON summary.
pub fn generate_json_summary(summary: &ExecutiveSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

/// Write a rendered summary to `path`.
pub fn write_summary(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SummaryOverview;
    use chrono::Utc;

    fn create_test_summary() -> ExecutiveSummary {
        ExecutiveSummary {
            outcome: "Attrition".to_string(),
            organisation: "ACME".to_string(),
            min_support: 10,
            overview: SummaryOverview {
                dataset: "data/attrition.csv".to_string(),
                generated_at: Utc::now(),
                total_employees: 1470,
                attrition_count: 237,
                attrition_rate: 237.0 / 1470.0,
                features_analyzed: 6,
            },
            key_drivers: vec![Driver {
                feature: "OverTime".to_string(),
                value: "Yes".to_string(),
                rate: 0.31,
                support: 416,
            }],
            risk_profiles: vec![Combination {
                feature_1: "OverTime".to_string(),
                value_1: "Yes".to_string(),
                feature_2: "job_role".to_string(),
                value_2: "Sales Representative".to_string(),
                rate: 0.667,
                support: 24,
            }],
            recommendations: vec![Recommendation {
                title: "Improve Work-Life Balance".to_string(),
                actions: vec!["Review overtime policies for high-risk roles".to_string()],
            }],
        }
    }

    #[test]
    fn test_generate_markdown_summary() {
        let markdown = generate_markdown_summary(&create_test_summary());

        assert!(markdown.starts_with("# Executive Summary: Attrition Drivers"));
        assert!(markdown.contains("## Overview"));
        assert!(markdown.contains("- **Employees:** 1470"));
        assert!(markdown.contains("- **Attrition:** 237 (16%)"));
        assert!(markdown.contains("| 1 | Overtime | Yes | 31% | 416 |"));
        assert!(markdown.contains("Overtime = Yes, Job Role = Sales Representative"));
        assert!(markdown.contains("## Recommendations for ACME"));
        assert!(markdown.contains("- Review overtime policies for high-risk roles"));
    }

    #[test]
    fn test_table_cells_escape_pipes() {
        let mut summary = create_test_summary();
        summary.key_drivers[0].value = "Sales|Marketing".to_string();
        summary.risk_profiles[0].value_2 = "R|D".to_string();

        let markdown = generate_markdown_summary(&summary);
        assert!(markdown.contains("| 1 | Overtime | Sales\\|Marketing | 31% | 416 |"));
        assert!(markdown.contains("| 1 | Overtime = Yes, Job Role = R\\|D | 67% | 24 |"));
    }

    #[test]
    fn test_empty_rankings_explain_support() {
        let mut summary = create_test_summary();
        summary.key_drivers.clear();
        summary.risk_profiles.clear();
        summary.recommendations.clear();

        let markdown = generate_markdown_summary(&summary);
        assert!(markdown.contains("No feature value is shared by at least 10 employees."));
        assert!(markdown.contains("No feature combination is shared by at least 10 employees."));
        assert!(!markdown.contains("## Recommendations"));
    }

    #[test]
    fn test_generate_json_summary() {
        let json = generate_json_summary(&create_test_summary()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["overview"]["total_employees"], 1470);
        assert_eq!(value["key_drivers"][0]["feature"], "OverTime");
        assert_eq!(value["risk_profiles"][0]["support"], 24);
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        write_summary("# Summary\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Summary\n");
    }
}
