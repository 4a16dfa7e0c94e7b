// Command handlers module
pub mod analyze;
pub mod config;
pub mod export;
pub mod recommendations;
pub mod stats;

use anyhow::Result;

use crate::config::Config;
use crate::storage::Database;

pub use analyze::{
    analyze_inputs, fetch_inputs, handle_analyze_command, record_outcome, run_analysis, AnalysisInputs, AnalysisRequest,
};
pub use config::handle_config_action;
pub use export::handle_export_command;
pub use recommendations::{handle_recommendations_command, handle_review_command};
pub use stats::{handle_logs_command, handle_sessions_command, handle_stats_command};

/// Open the database configured in `storage.database_path`
pub fn open_database(config: &Config) -> Result<Database> {
    let path = config.database_path()?;
    tracing::debug!(path = %path.display(), "Opening database");
    Database::new(&path)
}
