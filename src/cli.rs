//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

/// Attrition Explorer - HR attrition driver and heatmap dashboard
///
/// Loads an employee CSV, serves a three-tab dashboard (Driver Explorer,
/// Heatmap Lab, Executive Summary) or prints the executive summary.
///
/// Examples:
///   attrition-explorer --data data/attrition.csv
///   attrition-explorer --data hr.csv --port 9000 --bind 127.0.0.1
///   attrition-explorer --data hr.csv --summary --format json -o summary.json
///   attrition-explorer --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Employee CSV to analyze
    ///
    /// Overrides `data.path` from the config file.
    #[arg(short, long, value_name = "FILE", env = "ATTRITION_DATA")]
    pub data: Option<PathBuf>,

    /// Binary outcome column (default: Attrition)
    #[arg(long, value_name = "COLUMN")]
    pub outcome: Option<String>,

    /// Fixed feature list (comma-separated)
    ///
    /// Example: --features OverTime,JobLevel,Department
    #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
    pub features: Option<Vec<String>>,

    /// Address to bind the dashboard to (default: 0.0.0.0)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<IpAddr>,

    /// Port to listen on (default: 8501)
    #[arg(short, long, value_name = "PORT", env = "ATTRITION_PORT")]
    pub port: Option<u16>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .attrition.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the executive summary instead of serving the dashboard
    #[arg(long)]
    pub summary: bool,

    /// Number of key drivers and risk profiles in the summary
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Summary output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the summary to a file instead of stdout
    #[arg(short, long, value_name = "FILE", requires = "summary")]
    pub output: Option<PathBuf>,

    /// Generate a default .attrition.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the executive summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if let Some(ref outcome) = self.outcome {
            if outcome.trim().is_empty() {
                return Err("Outcome column must not be empty".to_string());
            }
        }

        if let Some(ref features) = self.features {
            if features.iter().any(|f| f.trim().is_empty()) {
                return Err("Feature names must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data: Some(PathBuf::from("hr.csv")),
            outcome: None,
            features: None,
            bind: None,
            port: None,
            config: None,
            verbose: false,
            quiet: false,
            summary: false,
            top: None,
            format: OutputFormat::Markdown,
            output: None,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "attrition-explorer",
            "--data",
            "hr.csv",
            "--features",
            "OverTime,JobLevel",
            "--port",
            "9000",
            "--summary",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.data, Some(PathBuf::from("hr.csv")));
        assert_eq!(
            args.features,
            Some(vec!["OverTime".to_string(), "JobLevel".to_string()])
        );
        assert_eq!(args.port, Some(9000));
        assert!(args.summary);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_output_requires_summary() {
        let result = Args::try_parse_from(["attrition-explorer", "--output", "out.md"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_port() {
        let mut args = make_args();
        args.port = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_values() {
        let mut args = make_args();
        args.top = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.outcome = Some(" ".to_string());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.features = Some(vec!["OverTime".to_string(), String::new()]);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.init_config = true;
        args.port = Some(0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
