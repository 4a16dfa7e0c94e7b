use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::storage::{Database, SessionRecord, StoredRecommendation};

pub const EXPORT_VERSION: &str = "1.0.0";
pub const RECOMMENDATION_LIMIT: usize = 1000;
pub const SESSION_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(format!("Invalid export format: {}. Must be 'json' or 'csv'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub recommendations: Vec<StoredRecommendation>,
    pub analysis_sessions: Vec<SessionRecord>,
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub recommendations: usize,
    pub sessions: usize,
}

#[derive(Debug)]
pub struct ExportManager<'a> {
    database: &'a Database,
}

impl<'a> ExportManager<'a> {
    pub fn new(database: &'a Database) -> Self {
        Self { database }
    }

    pub fn export(&self, format: ExportFormat, output_path: &Path) -> Result<ExportSummary> {
        match format {
            ExportFormat::Json => self.export_to_json(output_path),
            ExportFormat::Csv => self.export_to_csv(output_path),
        }
    }

    /// Recommendations and session history as one JSON document
    pub fn export_to_json(&self, output_path: &Path) -> Result<ExportSummary> {
        let document = ExportDocument {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            recommendations: self.database.list_recommendations(RECOMMENDATION_LIMIT, None, None)?,
            analysis_sessions: self.database.list_sessions(SESSION_LIMIT)?,
        };

        let json_content = serde_json::to_string_pretty(&document).context("Failed to encode export")?;
        write_file(output_path, &json_content)?;

        Ok(ExportSummary {
            path: output_path.to_path_buf(),
            recommendations: document.recommendations.len(),
            sessions: document.analysis_sessions.len(),
        })
    }

    /// Recommendations only, one row each
    pub fn export_to_csv(&self, output_path: &Path) -> Result<ExportSummary> {
        let recommendations = self.database.list_recommendations(RECOMMENDATION_LIMIT, None, None)?;
        write_file(output_path, &recommendations_csv(&recommendations))?;

        Ok(ExportSummary {
            path: output_path.to_path_buf(),
            recommendations: recommendations.len(),
            sessions: 0,
        })
    }
}

/// `cloud_optimization_<timestamp>.<ext>` in the current directory
pub fn default_file_name(format: ExportFormat, now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!(
        "cloud_optimization_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory: {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write export file: {}", path.display()))
}

const CSV_HEADER: &str = "id,session_id,created_at,resource_id,resource_type,issue,current_state,action,\
estimated_savings,risk,priority,implementation_effort,status,approved,approved_at";

fn recommendations_csv(recommendations: &[StoredRecommendation]) -> String {
    let mut csv_content = String::new();
    csv_content.push_str(CSV_HEADER);
    csv_content.push('\n');

    for stored in recommendations {
        let rec = &stored.recommendation;
        let fields = [
            stored.id.to_string(),
            stored.session_id.to_string(),
            csv_field(&stored.created_at),
            csv_field(&rec.resource_id),
            rec.resource_type.to_string(),
            csv_field(&rec.issue),
            csv_field(&rec.current_state),
            csv_field(&rec.action),
            format!("{:.2}", rec.estimated_savings),
            rec.risk.to_string(),
            rec.priority.to_string(),
            rec.implementation_effort.to_string(),
            stored.status.to_string(),
            stored.approved.to_string(),
            csv_field(stored.approved_at.as_deref().unwrap_or("")),
        ];
        csv_content.push_str(&fields.join(","));
        csv_content.push('\n');
    }

    csv_content
}

/// Quote a text field, doubling embedded quotes
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
