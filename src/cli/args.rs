use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{RecommendationStatus, ResourceType};
use crate::sync::ExportFormat;

#[derive(Parser, Debug)]
#[command(name = "cloudopt")]
#[command(about = "Cloud cost optimization recommendations")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Styled table output
    #[arg(long, global = true)]
    pub colored: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., source.provider)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Cloud provider (gcp, aws, azure). Defaults to source.provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Usage window (last_30_days, last_7_days). Defaults to source.time_range
    #[arg(long)]
    pub time_range: Option<String>,

    /// Read usage data from a JSON file instead of the built-in source
    #[arg(long)]
    pub usage_file: Option<PathBuf>,

    /// Read billing data from a JSON file instead of the built-in source
    #[arg(long)]
    pub billing_file: Option<PathBuf>,

    /// Resource types whose rules are sent to the model (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub rules: Option<Vec<ResourceType>>,

    /// Skip the model and use rule-based analysis
    #[arg(long)]
    pub offline: bool,

    /// Do not persist the result
    #[arg(long)]
    pub no_save: bool,

    /// Also write the recommendation set as JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch usage and billing data and generate recommendations
    Analyze(AnalyzeArgs),

    /// List stored recommendations, newest first
    Recommendations {
        /// Maximum rows. Defaults to output.list_limit
        #[arg(long)]
        limit: Option<usize>,

        /// Filter by status (pending, approved, rejected)
        #[arg(long)]
        status: Option<RecommendationStatus>,

        /// Filter by resource type (compute, storage, network)
        #[arg(long)]
        resource_type: Option<ResourceType>,
    },

    /// Approve a pending recommendation
    Approve {
        /// Recommendation ID
        id: i64,
    },

    /// Reject a pending recommendation
    Reject {
        /// Recommendation ID
        id: i64,
    },

    /// Show aggregate statistics
    Stats,

    /// Show analysis session history
    Sessions {
        /// Maximum rows. Defaults to output.list_limit
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the persistent event log, newest first
    Logs {
        /// Maximum rows. Defaults to output.list_limit
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export stored recommendations
    Export {
        /// Export format (json, csv)
        #[arg(long, default_value = "json")]
        format: ExportFormat,

        /// Output file. Defaults to a timestamped name in the current directory
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::try_parse_from([
            "cloudopt",
            "analyze",
            "--provider",
            "aws",
            "--rules",
            "compute,storage",
            "--offline",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.provider.as_deref(), Some("aws"));
        assert_eq!(args.rules, Some(vec![ResourceType::Compute, ResourceType::Storage]));
        assert!(args.offline);
        assert!(!args.no_save);
    }

    #[test]
    fn test_parse_recommendation_filters() {
        let cli = Cli::try_parse_from([
            "cloudopt",
            "recommendations",
            "--status",
            "Pending",
            "--resource-type",
            "storage",
            "--limit",
            "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Recommendations { limit, status, resource_type } => {
                assert_eq!(limit, Some(5));
                assert_eq!(status, Some(RecommendationStatus::Pending));
                assert_eq!(resource_type, Some(ResourceType::Storage));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        assert!(Cli::try_parse_from(["cloudopt", "recommendations", "--status", "done"]).is_err());
    }

    #[test]
    fn test_parse_logs_limit() {
        let cli = Cli::try_parse_from(["cloudopt", "logs", "--limit", "20"]).unwrap();
        assert!(matches!(cli.command, Commands::Logs { limit: Some(20) }));
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from(["cloudopt", "export", "--format", "csv", "--output", "out.csv"]).unwrap();
        match cli.command {
            Commands::Export { format, output } => {
                assert_eq!(format, ExportFormat::Csv);
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
