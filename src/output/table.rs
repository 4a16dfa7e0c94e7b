use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::money;
use crate::storage::{LogEntry, SessionRecord, Statistics, StoredRecommendation};

const SUMMARY_WIDTH: usize = 60;

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self, colored: bool) -> String;
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

/// Rounded box drawing when styled output is on, plain ASCII otherwise
fn render<T: Tabled>(rows: Vec<T>, colored: bool) -> String {
    let mut table = Table::new(rows);
    if colored {
        table.with(Style::rounded());
    } else {
        table.with(Style::ascii());
    }
    table.to_string()
}

#[derive(Tabled, Serialize, Debug)]
pub struct RecommendationRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Resource")]
    pub resource_id: String,
    #[tabled(rename = "Type")]
    pub resource_type: String,
    #[tabled(rename = "Action")]
    pub action: String,
    #[tabled(rename = "Savings")]
    pub savings: String,
    #[tabled(rename = "Risk")]
    pub risk: String,
    #[tabled(rename = "Priority")]
    pub priority: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl RecommendationRow {
    pub fn from_stored(stored: &StoredRecommendation) -> Self {
        let rec = &stored.recommendation;
        Self {
            id: stored.id,
            resource_id: rec.resource_id.clone(),
            resource_type: rec.resource_type.to_string(),
            action: rec.action.clone(),
            savings: money::format(rec.estimated_savings),
            risk: rec.risk.to_string(),
            priority: rec.priority.to_string(),
            status: stored.status.to_string(),
        }
    }
}

#[derive(Tabled, Serialize, Debug)]
pub struct SessionRow {
    #[tabled(rename = "Session")]
    pub id: i64,
    #[tabled(rename = "Created")]
    pub created_at: String,
    #[tabled(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Recommendations")]
    pub count: u32,
    #[tabled(rename = "Savings")]
    pub savings: String,
    #[tabled(rename = "Summary")]
    pub summary: String,
}

impl SessionRow {
    pub fn from_session(session: &SessionRecord) -> Self {
        Self {
            id: session.id,
            created_at: format_timestamp(&session.created_at),
            source: session.source.clone(),
            count: session.recommendations_count,
            savings: money::format(session.total_savings),
            summary: truncate(&session.summary, SUMMARY_WIDTH),
        }
    }
}

#[derive(Tabled, Serialize, Debug)]
pub struct StatRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl StatRow {
    fn new(metric: impl Into<String>, value: impl ToString) -> Self {
        Self {
            metric: metric.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Tabled, Serialize, Debug)]
pub struct LogRow {
    #[tabled(rename = "Time")]
    pub timestamp: String,
    #[tabled(rename = "Level")]
    pub level: String,
    #[tabled(rename = "Component")]
    pub component: String,
    #[tabled(rename = "Message")]
    pub message: String,
}

impl LogRow {
    pub fn from_entry(entry: &LogEntry) -> Self {
        Self {
            timestamp: format_timestamp(&entry.timestamp),
            level: entry.level.clone(),
            component: entry.component.clone(),
            message: truncate(&entry.message, SUMMARY_WIDTH),
        }
    }
}

impl OutputFormat for Vec<StoredRecommendation> {
    fn to_table(&self, colored: bool) -> String {
        if self.is_empty() {
            return "No recommendations found.".to_string();
        }

        let rows: Vec<RecommendationRow> = self.iter().map(RecommendationRow::from_stored).collect();
        render(rows, colored)
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl OutputFormat for Vec<SessionRecord> {
    fn to_table(&self, colored: bool) -> String {
        if self.is_empty() {
            return "No analysis sessions found.".to_string();
        }

        let rows: Vec<SessionRow> = self.iter().map(SessionRow::from_session).collect();
        render(rows, colored)
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl OutputFormat for Vec<LogEntry> {
    fn to_table(&self, colored: bool) -> String {
        if self.is_empty() {
            return "No log entries found.".to_string();
        }

        let rows: Vec<LogRow> = self.iter().map(LogRow::from_entry).collect();
        render(rows, colored)
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl OutputFormat for Statistics {
    fn to_table(&self, colored: bool) -> String {
        let mut rows = vec![
            StatRow::new("Total recommendations", self.total_recommendations),
            StatRow::new("Potential savings (not rejected)", money::format(self.total_savings)),
            StatRow::new("Analysis sessions", self.total_sessions),
        ];

        let groups = [
            ("Status", &self.by_status),
            ("Type", &self.by_resource_type),
            ("Risk", &self.by_risk),
        ];
        for (label, counts) in groups {
            rows.extend(
                counts
                    .iter()
                    .map(|(key, count)| StatRow::new(format!("{}: {}", label, key), count)),
            );
        }

        render(rows, colored)
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Shorten an RFC 3339 timestamp to minutes, falling back to the raw text
fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head)
}
