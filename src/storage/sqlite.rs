use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::models::{
    Recommendation, RecommendationSet, RecommendationStatus, ResourceType,
};
use crate::storage::migrations::apply_migrations;

pub type SessionId = i64;
pub type RecommendationId = i64;

/// A persisted recommendation with its review state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecommendation {
    pub id: RecommendationId,
    pub session_id: SessionId,
    pub created_at: String,
    pub status: RecommendationStatus,
    pub approved: bool,
    pub approved_at: Option<String>,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub created_at: String,
    pub source: String,
    pub summary: String,
    pub total_savings: f64,
    pub recommendations_count: u32,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statistics {
    pub total_recommendations: u64,
    /// Sum over every recommendation that is not rejected
    pub total_savings: f64,
    pub by_status: BTreeMap<String, u64>,
    pub by_resource_type: BTreeMap<String, u64>,
    pub by_risk: BTreeMap<String, u64>,
    pub total_sessions: u64,
}

/// One row of the persistent event log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    pub level: String,
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Result of an approve or reject request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Already in the requested state
    Unchanged,
    /// Already in the opposite terminal state
    Refused { current: RecommendationStatus },
}

pub struct Database {
    connection: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connection", &"<SQLite Connection>")
            .finish()
    }
}

const RECOMMENDATION_COLUMNS: &str = "id, session_id, created_at, resource_id, resource_type, issue, \
     current_state, action, estimated_savings, risk, priority, implementation_effort, status, \
     approved, approved_at";

impl Database {
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        let connection = Connection::open(path)
            .with_context(|| format!("Failed to open database at: {}", path.display()))?;

        connection
            .execute_batch(
                "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = memory;
        ",
            )
            .context("Failed to configure SQLite pragmas")?;

        let db = Database { connection };
        db.init_schema()?;

        Ok(db)
    }

    pub fn init_schema(&self) -> Result<()> {
        apply_migrations(&self.connection).context("Failed to apply database migrations")
    }

    /// Store one session and all of its recommendations, or nothing
    pub fn save(&self, set: &RecommendationSet, source: &str) -> Result<SessionId> {
        let now = chrono::Utc::now().to_rfc3339();
        let insights = serde_json::to_string(&set.insights).context("Failed to encode insights")?;

        let tx = self
            .connection
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        tx.execute(
            "INSERT INTO analysis_sessions (created_at, source, summary, total_savings, recommendations_count, insights)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                now,
                source,
                set.summary,
                set.total_potential_savings,
                set.recommendations.len() as i64,
                insights
            ],
        )
        .context("Failed to insert analysis session")?;
        let session_id = tx.last_insert_rowid();

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO recommendations (session_id, created_at, resource_id, resource_type, issue,
                     current_state, action, estimated_savings, risk, priority, implementation_effort, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                )
                .context("Failed to prepare recommendation insert")?;

            for rec in &set.recommendations {
                let metadata = serde_json::to_string(rec).context("Failed to encode recommendation")?;
                stmt.execute(params![
                    session_id,
                    now,
                    rec.resource_id,
                    rec.resource_type.as_str(),
                    rec.issue,
                    rec.current_state,
                    rec.action,
                    rec.estimated_savings,
                    rec.risk.as_str(),
                    rec.priority.as_str(),
                    rec.implementation_effort.as_str(),
                    metadata
                ])
                .with_context(|| format!("Failed to insert recommendation for {}", rec.resource_id))?;
            }
        }

        tx.commit().context("Failed to commit analysis session")?;
        Ok(session_id)
    }

    /// Newest session first, original order within a session
    pub fn list_recommendations(
        &self,
        limit: usize,
        status: Option<RecommendationStatus>,
        resource_type: Option<ResourceType>,
    ) -> Result<Vec<StoredRecommendation>> {
        let sql = format!(
            "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR resource_type = ?2)
             ORDER BY created_at DESC, session_id DESC, id ASC
             LIMIT ?3"
        );
        let mut stmt = self
            .connection
            .prepare(&sql)
            .context("Failed to prepare recommendations query")?;

        let rows = stmt
            .query_map(
                params![
                    status.map(|s| s.as_str()),
                    resource_type.map(|t| t.as_str()),
                    limit as i64
                ],
                recommendation_from_row,
            )
            .context("Failed to execute recommendations query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to parse recommendation row")?);
        }

        Ok(results)
    }

    pub fn get_recommendation(&self, id: RecommendationId) -> Result<Option<StoredRecommendation>> {
        let sql = format!("SELECT {RECOMMENDATION_COLUMNS} FROM recommendations WHERE id = ?1");
        self.connection
            .query_row(&sql, [id], recommendation_from_row)
            .optional()
            .with_context(|| format!("Failed to load recommendation {}", id))
    }

    pub fn approve(&self, id: RecommendationId) -> Result<Transition> {
        self.transition(id, RecommendationStatus::Approved)
    }

    pub fn reject(&self, id: RecommendationId) -> Result<Transition> {
        self.transition(id, RecommendationStatus::Rejected)
    }

    fn transition(&self, id: RecommendationId, target: RecommendationStatus) -> Result<Transition> {
        let now = chrono::Utc::now().to_rfc3339();
        let updated = match target {
            RecommendationStatus::Approved => self.connection.execute(
                "UPDATE recommendations SET status = 'approved', approved = 1, approved_at = ?2
                 WHERE id = ?1 AND status = 'pending'",
                params![id, now],
            ),
            RecommendationStatus::Rejected => self.connection.execute(
                "UPDATE recommendations SET status = 'rejected' WHERE id = ?1 AND status = 'pending'",
                params![id],
            ),
            RecommendationStatus::Pending => bail!("Cannot move a recommendation back to pending"),
        }
        .with_context(|| format!("Failed to update recommendation {}", id))?;

        if updated > 0 {
            return Ok(Transition::Applied);
        }

        let current: Option<String> = self
            .connection
            .query_row("SELECT status FROM recommendations WHERE id = ?1", [id], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to load status of recommendation {}", id))?;

        let Some(current) = current else {
            bail!("Recommendation {} not found", id);
        };
        let current: RecommendationStatus = current.parse().map_err(anyhow::Error::msg)?;

        if current == target {
            Ok(Transition::Unchanged)
        } else {
            Ok(Transition::Refused { current })
        }
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let total_recommendations: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM recommendations", [], |row| row.get(0))
            .context("Failed to count recommendations")?;

        let total_savings: f64 = self
            .connection
            .query_row(
                "SELECT COALESCE(SUM(estimated_savings), 0.0) FROM recommendations WHERE status != 'rejected'",
                [],
                |row| row.get(0),
            )
            .context("Failed to sum savings")?;

        let total_sessions: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM analysis_sessions", [], |row| row.get(0))
            .context("Failed to count sessions")?;

        Ok(Statistics {
            total_recommendations: total_recommendations as u64,
            total_savings: crate::models::money::round_cents(total_savings),
            by_status: self.count_by("status")?,
            by_resource_type: self.count_by("resource_type")?,
            by_risk: self.count_by("risk")?,
            total_sessions: total_sessions as u64,
        })
    }

    fn count_by(&self, column: &'static str) -> Result<BTreeMap<String, u64>> {
        let sql = format!("SELECT {column}, COUNT(*) FROM recommendations GROUP BY {column}");
        let mut stmt = self
            .connection
            .prepare(&sql)
            .with_context(|| format!("Failed to prepare count by {}", column))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .with_context(|| format!("Failed to count by {}", column))?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (key, count) = row.context("Failed to parse count row")?;
            counts.insert(key, count as u64);
        }
        Ok(counts)
    }

    /// Newest first
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT id, created_at, source, summary, total_savings, recommendations_count, insights
                 FROM analysis_sessions ORDER BY created_at DESC, id DESC LIMIT ?1",
            )
            .context("Failed to prepare sessions query")?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                let insights: String = row.get(6)?;
                Ok(SessionRecord {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                    source: row.get(2)?,
                    summary: row.get(3)?,
                    total_savings: row.get(4)?,
                    recommendations_count: row.get(5)?,
                    insights: serde_json::from_str(&insights).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
                    })?,
                })
            })
            .context("Failed to execute sessions query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to parse session row")?);
        }

        Ok(results)
    }

    /// Append an event to the persistent log
    pub fn log(
        &self,
        level: tracing::Level,
        component: &str,
        message: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<()> {
        let metadata = metadata
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to encode event metadata")?;

        self.connection
            .execute(
                "INSERT INTO event_log (timestamp, level, component, message, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![chrono::Utc::now().to_rfc3339(), level.as_str(), component, message, metadata],
            )
            .context("Failed to write event log")?;
        Ok(())
    }

    /// Newest first
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT id, timestamp, level, component, message, metadata
                 FROM event_log ORDER BY id DESC LIMIT ?1",
            )
            .context("Failed to prepare event log query")?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                let metadata: Option<String> = row.get(5)?;
                Ok(LogEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    level: row.get(2)?,
                    component: row.get(3)?,
                    message: row.get(4)?,
                    metadata: metadata
                        .map(|text| serde_json::from_str(&text))
                        .transpose()
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
                        })?,
                })
            })
            .context("Failed to execute event log query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to parse event log row")?);
        }

        Ok(results)
    }
}

fn parse_column<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into()))
}

fn recommendation_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecommendation> {
    Ok(StoredRecommendation {
        id: row.get(0)?,
        session_id: row.get(1)?,
        created_at: row.get(2)?,
        recommendation: Recommendation {
            resource_id: row.get(3)?,
            resource_type: parse_column(row, 4)?,
            issue: row.get(5)?,
            current_state: row.get(6)?,
            action: row.get(7)?,
            estimated_savings: row.get(8)?,
            risk: parse_column(row, 9)?,
            priority: parse_column(row, 10)?,
            implementation_effort: parse_column(row, 11)?,
        },
        status: parse_column(row, 12)?,
        approved: row.get(13)?,
        approved_at: row.get(14)?,
    })
}
