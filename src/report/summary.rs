//! Executive summary model.

use crate::analysis::{key_drivers, risk_profiles};
use crate::config::{Recommendation, SummaryConfig};
use crate::dataset::Dataset;
use crate::error::InvalidFeatureError;
use crate::models::{Combination, Driver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dataset-level figures shown at the top of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOverview {
    /// Where the data came from.
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub total_employees: usize,
    pub attrition_count: usize,
    pub attrition_rate: f64,
    pub features_analyzed: usize,
}

/// Ranked attrition drivers, risk profiles and recommended actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub outcome: String,
    pub organisation: String,
    /// Minimum group size a driver or profile must have.
    pub min_support: usize,
    pub overview: SummaryOverview,
    pub key_drivers: Vec<Driver>,
    pub risk_profiles: Vec<Combination>,
    pub recommendations: Vec<Recommendation>,
}

impl ExecutiveSummary {
    /// Rank the drivers and profiles of `features` against `outcome`.
    pub fn generate(
        dataset: &Dataset,
        features: &[String],
        outcome: &str,
        settings: &SummaryConfig,
    ) -> Result<Self, InvalidFeatureError> {
        let flags = dataset.outcome_flags(outcome)?;
        let attrition_count = flags.iter().filter(|f| **f).count();
        let attrition_rate = if dataset.is_empty() {
            0.0
        } else {
            attrition_count as f64 / flags.len() as f64
        };

        let key_drivers = key_drivers(
            dataset,
            features,
            outcome,
            settings.top_drivers,
            settings.min_support,
        )?;
        let risk_profiles = risk_profiles(
            dataset,
            features,
            outcome,
            settings.top_profiles,
            settings.min_support,
        )?;

        debug!(
            "Summary: {} drivers, {} profiles over {} features",
            key_drivers.len(),
            risk_profiles.len(),
            features.len()
        );

        Ok(Self {
            outcome: outcome.to_string(),
            organisation: settings.organisation.clone(),
            min_support: settings.min_support,
            overview: SummaryOverview {
                dataset: dataset.source().display().to_string(),
                generated_at: Utc::now(),
                total_employees: dataset.len(),
                attrition_count,
                attrition_rate,
                features_analyzed: features.len(),
            },
            key_drivers,
            risk_profiles,
            recommendations: settings.recommendations.clone(),
        })
    }
}
