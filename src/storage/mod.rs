// Recommendation persistence
pub mod migrations;
pub mod sqlite;

pub use sqlite::{
    Database, LogEntry, RecommendationId, SessionId, SessionRecord, Statistics, StoredRecommendation, Transition,
};
