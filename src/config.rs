//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.attrition.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".attrition.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Driver explorer settings.
    #[serde(default)]
    pub explorer: ExplorerConfig,

    /// Executive summary settings.
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Dataset location and schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the employee CSV.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Binary outcome column.
    #[serde(default = "default_outcome")]
    pub outcome_column: String,

    /// Fixed feature list. Empty means infer from the dataset.
    #[serde(default)]
    pub features: Vec<String>,

    /// Columns never offered as features (identifiers, constants).
    #[serde(default = "default_exclude_columns")]
    pub exclude_columns: Vec<String>,

    /// Inferred features must have at most this many distinct values.
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,

    /// Numeric columns to cut into labelled ranges.
    #[serde(default)]
    pub bands: Vec<BandConfig>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            outcome_column: default_outcome(),
            features: Vec::new(),
            exclude_columns: default_exclude_columns(),
            max_categories: default_max_categories(),
            bands: default_bands(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/attrition.csv")
}

fn default_outcome() -> String {
    "Attrition".to_string()
}

fn default_exclude_columns() -> Vec<String> {
    vec!["EmployeeNumber", "EmployeeCount", "Over18", "StandardHours"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_categories() -> usize {
    25
}

fn default_bands() -> Vec<BandConfig> {
    vec![
        BandConfig {
            column: "MonthlyIncome".to_string(),
            edges: vec![3000.0, 6000.0, 10000.0],
            name: Some("IncomeBand".to_string()),
        },
        BandConfig {
            column: "DistanceFromHome".to_string(),
            edges: vec![5.0, 10.0, 20.0],
            name: Some("CommuteBand".to_string()),
        },
    ]
}

/// A numeric column cut at fixed edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    /// Source numeric column.
    pub column: String,

    /// Strictly increasing cut points.
    pub edges: Vec<f64>,

    /// Name of the derived column (default `<column>_band`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BandConfig {
    /// Name of the derived column.
    pub fn output_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_band", self.column))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn default_bind() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8501
}

/// Driver explorer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Risk combinations listed under the bar chart.
    #[serde(default = "default_top_combinations")]
    pub top_combinations: usize,

    /// Minimum employees behind a listed combination.
    #[serde(default = "default_min_support")]
    pub min_support: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            top_combinations: default_top_combinations(),
            min_support: default_min_support(),
        }
    }
}

fn default_top_combinations() -> usize {
    3
}

fn default_min_support() -> usize {
    10
}

/// Executive summary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Number of key drivers.
    #[serde(default = "default_top_n")]
    pub top_drivers: usize,

    /// Number of high-risk profiles.
    #[serde(default = "default_top_n")]
    pub top_profiles: usize,

    /// Minimum employees behind a driver value or profile.
    #[serde(default = "default_min_support")]
    pub min_support: usize,

    /// Organisation named in the recommendations heading.
    #[serde(default = "default_organisation")]
    pub organisation: String,

    /// Recommended actions.
    #[serde(default = "default_recommendations")]
    pub recommendations: Vec<Recommendation>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            top_drivers: default_top_n(),
            top_profiles: default_top_n(),
            min_support: default_min_support(),
            organisation: default_organisation(),
            recommendations: default_recommendations(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_organisation() -> String {
    "ACME".to_string()
}

/// A titled group of recommended actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub actions: Vec<String>,
}

fn recommendation(title: &str, actions: &[&str]) -> Recommendation {
    Recommendation {
        title: title.to_string(),
        actions: actions.iter().map(|a| a.to_string()).collect(),
    }
}

fn default_recommendations() -> Vec<Recommendation> {
    vec![
        recommendation(
            "Improve Work-Life Balance",
            &[
                "Review overtime policies for high-risk roles",
                "Introduce flexible working hours for impacted teams",
            ],
        ),
        recommendation(
            "Strengthen Career Progression",
            &[
                "Address role stagnation with internal mobility programs",
                "Define clearer promotion and growth paths",
            ],
        ),
        recommendation(
            "Managerial Effectiveness",
            &[
                "Train managers in departments with high attrition signals",
                "Introduce regular check-ins for employee sentiment",
            ],
        ),
        recommendation(
            "Compensation & Commute Considerations",
            &[
                "Re-evaluate compensation bands for high-risk income segments",
                "Offer commute flexibility (hybrid / transport benefits)",
            ],
        ),
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only explicitly provided CLI values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.clone();
        }
        if let Some(ref outcome) = args.outcome {
            self.data.outcome_column = outcome.clone();
        }
        if let Some(ref features) = args.features {
            self.data.features = features.clone();
        }
        if let Some(bind) = args.bind {
            self.server.bind = bind;
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(top) = args.top {
            self.summary.top_drivers = top;
            self.summary.top_profiles = top;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.data.outcome_column.trim().is_empty() {
            bail!("data.outcome_column must not be empty");
        }
        if self.data.max_categories < 2 {
            bail!("data.max_categories must be at least 2");
        }
        if self
            .data
            .features
            .iter()
            .any(|f| f == &self.data.outcome_column)
        {
            bail!(
                "outcome column '{}' cannot also be a feature",
                self.data.outcome_column
            );
        }

        for band in &self.data.bands {
            if band.edges.is_empty() {
                bail!("band for '{}' needs at least one edge", band.column);
            }
            if band.edges.windows(2).any(|w| w[0] >= w[1]) {
                bail!("band edges for '{}' must be strictly increasing", band.column);
            }
            if band.edges.iter().any(|e| !e.is_finite()) {
                bail!("band edges for '{}' must be finite", band.column);
            }
        }

        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.summary.top_drivers == 0 || self.summary.top_profiles == 0 {
            bail!("summary.top_drivers and summary.top_profiles must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.outcome_column, "Attrition");
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:8501");
        assert_eq!(config.summary.top_drivers, 5);
        assert_eq!(config.summary.recommendations.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[data]
path = "hr.csv"
outcome_column = "Left"
features = ["OverTime", "JobLevel"]

[[data.bands]]
column = "Age"
edges = [30, 40]

[server]
bind = "127.0.0.1"
port = 9000

[summary]
top_drivers = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.path, PathBuf::from("hr.csv"));
        assert_eq!(config.data.outcome_column, "Left");
        assert_eq!(config.data.features, vec!["OverTime", "JobLevel"]);
        assert_eq!(config.data.bands.len(), 1);
        assert_eq!(config.data.bands[0].output_name(), "Age_band");
        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.summary.top_drivers, 3);
        assert_eq!(config.summary.top_profiles, 5);
        assert_eq!(config.explorer.top_combinations, 3);
    }

    #[test]
    fn test_validate_band_edges() {
        let mut config = Config::default();
        config.data.bands = vec![BandConfig {
            column: "Age".to_string(),
            edges: vec![40.0, 30.0],
            name: None,
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_band_edge_values() {
        let band = |edges: Vec<f64>| BandConfig {
            column: "Age".to_string(),
            edges,
            name: None,
        };

        let mut config = Config::default();
        config.data.bands = vec![band(Vec::new())];
        assert!(config.validate().is_err());

        config.data.bands = vec![band(vec![30.0, f64::INFINITY])];
        assert!(config.validate().is_err());

        config.data.bands = vec![band(vec![f64::NAN])];
        assert!(config.validate().is_err());

        config.data.bands = vec![band(vec![30.0, 40.0])];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_limits() {
        let mut config = Config::default();
        config.summary.top_drivers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.summary.top_profiles = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.data.max_categories = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.data.outcome_column = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_outcome_as_feature() {
        let mut config = Config::default();
        config.data.features = vec!["Attrition".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_with_args() {
        use clap::Parser;

        let args = crate::cli::Args::try_parse_from([
            "attrition-explorer",
            "--data",
            "other.csv",
            "--port",
            "9100",
            "--top",
            "2",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.data.path, PathBuf::from("other.csv"));
        assert_eq!(config.data.outcome_column, "Attrition");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.summary.top_drivers, 2);
        assert_eq!(config.summary.top_profiles, 2);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[summary]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data.bands, Config::default().data.bands);
    }
}
