// Export command handler
use anyhow::Result;
use std::path::PathBuf;

use crate::storage::Database;
use crate::sync::export::default_file_name;
use crate::sync::{ExportFormat, ExportManager};

pub fn handle_export_command(
    database: &Database,
    format: ExportFormat,
    output: Option<PathBuf>,
    json_output: bool,
) -> Result<()> {
    let path = output.unwrap_or_else(|| default_file_name(format, chrono::Utc::now()));
    let summary = ExportManager::new(database).export(format, &path)?;
    tracing::info!(path = %summary.path.display(), %format, "Exported recommendations");

    if json_output {
        let json = serde_json::json!({
            "status": "success",
            "path": summary.path,
            "format": format.to_string(),
            "recommendations": summary.recommendations,
            "sessions": summary.sessions,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!(
            "Exported {} recommendations and {} sessions to {}",
            summary.recommendations,
            summary.sessions,
            summary.path.display()
        );
    }

    Ok(())
}
