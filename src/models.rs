//! Data models for the attrition explorer.
//!
//! This module contains the core data structures shared by the loader,
//! the aggregation engine, the renderer and the summary generator.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single typed cell of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric cell (e.g. distance from home, monthly income).
    Number(f64),
    /// Derived numeric range; `rank` orders bands of the same column.
    Band { rank: usize, label: String },
    /// Categorical cell (e.g. department, overtime flag).
    Text(String),
}

impl Value {
    /// Parse a raw CSV field. Empty fields are null.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Value::Number(n)),
            _ => Some(Value::Text(trimmed.to_string())),
        }
    }

    /// Numeric view of the cell, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interpret the cell as a binary outcome flag.
    pub fn as_flag(&self) -> Option<bool> {
        parse_flag(&self.to_string())
    }

    /// Natural ordering used for heatmap axes: numbers numerically,
    /// bands by rank, text lexically. Mixed kinds order numbers first.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Band { rank: a, .. }, Value::Band { rank: b, .. }) => a.cmp(b),
            (Value::Number(_), _) => Ordering::Less,
            (_, Value::Number(_)) => Ordering::Greater,
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Band { label, .. } => write!(f, "{}", label),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Parse a binary flag token (`yes/no/true/false/y/n/1/0`, any case).
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Inferred kind of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every non-null value is a flag token.
    Binary,
    /// Every non-null value is a number.
    Numeric,
    /// Derived from a numeric column by banding.
    Banded,
    /// Anything else.
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Binary => write!(f, "binary"),
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Banded => write!(f, "banded"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Outcome statistics for one group of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    /// Feature value label shared by every row of the group.
    pub value: String,
    /// Number of rows in the group.
    pub count: usize,
    /// Rows with a positive outcome.
    pub positives: usize,
    /// `positives / count`, in `[0, 1]`.
    pub rate: f64,
}

impl GroupStat {
    /// Build a group from its tallies. `count` must be non-zero.
    pub fn new(value: String, count: usize, positives: usize) -> Self {
        Self {
            value,
            count,
            positives,
            rate: positives as f64 / count as f64,
        }
    }
}

/// Result of grouping by one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleAggregation {
    pub feature: String,
    pub outcome: String,
    /// Ordered by rate desc, count desc, value asc.
    pub groups: Vec<GroupStat>,
}

impl SingleAggregation {
    /// Total rows covered by the groups.
    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }
}

/// One heatmap cell. Absent support is never reported as a zero rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Cell {
    Observed {
        count: usize,
        positives: usize,
        rate: f64,
    },
    NoData,
}

impl Cell {
    /// Rate of an observed cell.
    pub fn rate(&self) -> Option<f64> {
        match self {
            Cell::Observed { rate, .. } => Some(*rate),
            Cell::NoData => None,
        }
    }

    /// Support of the cell (0 for no data).
    pub fn count(&self) -> usize {
        match self {
            Cell::Observed { count, .. } => *count,
            Cell::NoData => 0,
        }
    }
}

/// Result of grouping by the Cartesian product of two features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseAggregation {
    /// Feature on the row axis.
    pub feature_a: String,
    /// Feature on the column axis.
    pub feature_b: String,
    pub outcome: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<Cell>>,
}

impl PairwiseAggregation {
    /// Swap the row and column axes.
    #[allow(dead_code)] // Used by the symmetry checks
    pub fn transpose(&self) -> Self {
        let cells = (0..self.columns.len())
            .map(|c| self.cells.iter().map(|row| row[c].clone()).collect())
            .collect();

        Self {
            feature_a: self.feature_b.clone(),
            feature_b: self.feature_a.clone(),
            outcome: self.outcome.clone(),
            rows: self.columns.clone(),
            columns: self.rows.clone(),
            cells,
        }
    }

    /// Look up a cell by its axis labels.
    #[allow(dead_code)] // Convenience for callers holding labels
    pub fn cell(&self, row: &str, column: &str) -> Option<&Cell> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.columns.iter().position(|v| v == column)?;
        Some(&self.cells[r][c])
    }

    /// Iterate over observed cells as `(row, column, cell)`.
    pub fn observed(&self) -> impl Iterator<Item = (&str, &str, &Cell)> {
        self.rows.iter().enumerate().flat_map(move |(r, row)| {
            self.columns
                .iter()
                .enumerate()
                .map(move |(c, col)| (row.as_str(), col.as_str(), &self.cells[r][c]))
                .filter(|(_, _, cell)| matches!(cell, Cell::Observed { .. }))
        })
    }
}

/// A high-attrition pairing of two feature values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub feature_1: String,
    pub value_1: String,
    pub feature_2: String,
    pub value_2: String,
    pub rate: f64,
    pub support: usize,
}

/// A feature together with its highest-risk value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub feature: String,
    pub value: String,
    pub rate: f64,
    pub support: usize,
}

/// Order by rate desc, then support desc.
pub fn by_risk(a_rate: f64, a_support: usize, b_rate: f64, b_support: usize) -> Ordering {
    b_rate
        .total_cmp(&a_rate)
        .then_with(|| b_support.cmp(&a_support))
}

/// Turn a column name into a display label: `years_at_company` → `Years At Company`.
///
/// Every letter following a non-letter is uppercased and every other letter
/// lowercased, so `OverTime` reads `Overtime`.
pub fn humanize(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut word_start = true;

    for ch in name.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if word_start {
                label.extend(ch.to_uppercase());
            } else {
                label.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            label.push(ch);
            word_start = true;
        }
    }

    label
}

/// Format a rate as a whole percentage.
pub fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse(""), None);
        assert_eq!(Value::parse("  "), None);
        assert_eq!(Value::parse("12"), Some(Value::Number(12.0)));
        assert_eq!(Value::parse(" Sales "), Some(Value::Text("Sales".to_string())));
        assert_eq!(Value::parse("NaN"), Some(Value::Text("NaN".to_string())));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(
            Value::Band {
                rank: 1,
                label: "10-20".to_string()
            }
            .to_string(),
            "10-20"
        );
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(Value::Number(1.0).as_flag(), Some(true));
    }

    #[test]
    fn test_natural_ordering() {
        let mut values = vec![
            Value::Number(10.0),
            Value::Number(9.0),
            Value::Text("b".to_string()),
            Value::Text("a".to_string()),
        ];
        values.sort_by(|a, b| a.natural_cmp(b));
        let labels: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(labels, vec!["9", "10", "a", "b"]);
    }

    #[test]
    fn test_group_stat_rate() {
        let g = GroupStat::new("Yes".to_string(), 6, 3);
        assert_eq!(g.rate, 0.5);

        let all = GroupStat::new("Yes".to_string(), 4, 4);
        assert_eq!(all.rate, 1.0);
    }

    #[test]
    fn test_transpose() {
        let agg = PairwiseAggregation {
            feature_a: "A".to_string(),
            feature_b: "B".to_string(),
            outcome: "Attrition".to_string(),
            rows: vec!["a1".to_string(), "a2".to_string()],
            columns: vec!["b1".to_string()],
            cells: vec![
                vec![Cell::Observed {
                    count: 2,
                    positives: 1,
                    rate: 0.5,
                }],
                vec![Cell::NoData],
            ],
        };

        let t = agg.transpose();
        assert_eq!(t.feature_a, "B");
        assert_eq!(t.rows, vec!["b1"]);
        assert_eq!(t.columns, vec!["a1", "a2"]);
        assert_eq!(t.cell("b1", "a2"), Some(&Cell::NoData));
        assert_eq!(t.transpose(), agg);
        assert_eq!(agg.observed().count(), 1);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("years_at_company"), "Years At Company");
        assert_eq!(humanize("OverTime"), "Overtime");
        assert_eq!(humanize("JOB_LEVEL"), "Job Level");
        assert_eq!(humanize("distance-from_home"), "Distance-From Home");
        assert_eq!(humanize("income_band2"), "Income Band2");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.5), "50%");
        assert_eq!(percent(0.256), "26%");
    }
}
