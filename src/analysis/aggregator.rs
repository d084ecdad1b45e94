//! Group-wise attrition rates.
//!
//! Every function here is a pure function of the dataset and its arguments:
//! identical inputs always produce identical, identically ordered results.

use crate::dataset::Dataset;
use crate::error::InvalidFeatureError;
use crate::models::{
    by_risk, Cell, Combination, Driver, GroupStat, PairwiseAggregation, SingleAggregation,
};
use std::collections::HashMap;

/// Group rows by the value of `feature` and compute the outcome rate of each group.
///
/// Rows with a null `feature` cell are skipped. Groups are ordered by rate
/// (highest first), then count (largest first), then value label.
pub fn aggregate_single(
    dataset: &Dataset,
    feature: &str,
    outcome: &str,
) -> Result<SingleAggregation, InvalidFeatureError> {
    let column = dataset.column_index(feature)?;
    let flags = dataset.outcome_flags(outcome)?;

    let mut tallies: HashMap<String, (usize, usize)> = HashMap::new();
    for (cell, &positive) in dataset.values(column).zip(&flags) {
        let Some(value) = cell else { continue };
        let tally = tallies.entry(value.to_string()).or_default();
        tally.0 += 1;
        if positive {
            tally.1 += 1;
        }
    }

    let mut groups: Vec<GroupStat> = tallies
        .into_iter()
        .map(|(value, (count, positives))| GroupStat::new(value, count, positives))
        .collect();
    groups.sort_by(|a, b| {
        by_risk(a.rate, a.count, b.rate, b.count).then_with(|| a.value.cmp(&b.value))
    });

    Ok(SingleAggregation {
        feature: feature.to_string(),
        outcome: outcome.to_string(),
        groups,
    })
}

/// Outcome rate for every combination of `feature_a` and `feature_b` values.
///
/// Axes hold the distinct non-null values of each feature in natural order.
/// Combinations no row falls into are [`Cell::NoData`].
pub fn aggregate_pairwise(
    dataset: &Dataset,
    feature_a: &str,
    feature_b: &str,
    outcome: &str,
) -> Result<PairwiseAggregation, InvalidFeatureError> {
    let col_a = dataset.column_index(feature_a)?;
    let col_b = dataset.column_index(feature_b)?;
    let flags = dataset.outcome_flags(outcome)?;

    let rows: Vec<String> = labels(dataset, feature_a)?;
    let columns: Vec<String> = labels(dataset, feature_b)?;
    let row_pos: HashMap<&str, usize> = position_map(&rows);
    let col_pos: HashMap<&str, usize> = position_map(&columns);

    let mut tallies = vec![vec![(0usize, 0usize); columns.len()]; rows.len()];
    for ((a, b), &positive) in dataset.values(col_a).zip(dataset.values(col_b)).zip(&flags) {
        let (Some(a), Some(b)) = (a, b) else { continue };
        let (a, b) = (a.to_string(), b.to_string());
        let (Some(&r), Some(&c)) = (row_pos.get(a.as_str()), col_pos.get(b.as_str())) else {
            continue;
        };
        tallies[r][c].0 += 1;
        if positive {
            tallies[r][c].1 += 1;
        }
    }

    let cells = tallies
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(count, positives)| {
                    if count == 0 {
                        Cell::NoData
                    } else {
                        Cell::Observed {
                            count,
                            positives,
                            rate: positives as f64 / count as f64,
                        }
                    }
                })
                .collect()
        })
        .collect();

    Ok(PairwiseAggregation {
        feature_a: feature_a.to_string(),
        feature_b: feature_b.to_string(),
        outcome: outcome.to_string(),
        rows,
        columns,
        cells,
    })
}

/// Highest-rate value pairings of `feature` with each of `partners`.
///
/// Only combinations backed by at least `min_support` rows are considered.
pub fn top_combinations(
    dataset: &Dataset,
    feature: &str,
    partners: &[String],
    outcome: &str,
    limit: usize,
    min_support: usize,
) -> Result<Vec<Combination>, InvalidFeatureError> {
    let mut combos = Vec::new();

    for partner in partners.iter().filter(|p| p.as_str() != feature) {
        let pairwise = aggregate_pairwise(dataset, feature, partner, outcome)?;
        combos.extend(supported_combinations(&pairwise, min_support));
    }

    sort_combinations(&mut combos);
    combos.truncate(limit);
    Ok(combos)
}

/// Each feature's riskiest value, ranked across features.
///
/// A feature contributes the highest-rate group with at least `min_support`
/// rows; features without such a group are left out.
pub fn key_drivers(
    dataset: &Dataset,
    features: &[String],
    outcome: &str,
    limit: usize,
    min_support: usize,
) -> Result<Vec<Driver>, InvalidFeatureError> {
    let mut drivers = Vec::new();

    for feature in features {
        let aggregation = aggregate_single(dataset, feature, outcome)?;
        if let Some(group) = aggregation.groups.iter().find(|g| g.count >= min_support) {
            drivers.push(Driver {
                feature: feature.clone(),
                value: group.value.clone(),
                rate: group.rate,
                support: group.count,
            });
        }
    }

    drivers.sort_by(|a, b| {
        by_risk(a.rate, a.support, b.rate, b.support).then_with(|| a.feature.cmp(&b.feature))
    });
    drivers.truncate(limit);
    Ok(drivers)
}

/// Highest-rate value pairings over every unordered pair of `features`.
pub fn risk_profiles(
    dataset: &Dataset,
    features: &[String],
    outcome: &str,
    limit: usize,
    min_support: usize,
) -> Result<Vec<Combination>, InvalidFeatureError> {
    let mut combos = Vec::new();

    for (i, feature_a) in features.iter().enumerate() {
        for feature_b in &features[i + 1..] {
            let pairwise = aggregate_pairwise(dataset, feature_a, feature_b, outcome)?;
            combos.extend(supported_combinations(&pairwise, min_support));
        }
    }

    sort_combinations(&mut combos);
    combos.truncate(limit);
    Ok(combos)
}

fn labels(dataset: &Dataset, feature: &str) -> Result<Vec<String>, InvalidFeatureError> {
    Ok(dataset
        .distinct_values(feature)?
        .iter()
        .map(|v| v.to_string())
        .collect())
}

fn position_map(labels: &[String]) -> HashMap<&str, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect()
}

fn supported_combinations(pairwise: &PairwiseAggregation, min_support: usize) -> Vec<Combination> {
    pairwise
        .observed()
        .filter(|(_, _, cell)| cell.count() >= min_support)
        .filter_map(|(row, col, cell)| {
            Some(Combination {
                feature_1: pairwise.feature_a.clone(),
                value_1: row.to_string(),
                feature_2: pairwise.feature_b.clone(),
                value_2: col.to_string(),
                rate: cell.rate()?,
                support: cell.count(),
            })
        })
        .collect()
}

fn sort_combinations(combos: &mut [Combination]) {
    combos.sort_by(|a, b| {
        by_risk(a.rate, a.support, b.rate, b.support)
            .then_with(|| a.feature_1.cmp(&b.feature_1))
            .then_with(|| a.value_1.cmp(&b.value_1))
            .then_with(|| a.feature_2.cmp(&b.feature_2))
            .then_with(|| a.value_2.cmp(&b.value_2))
    });
}
