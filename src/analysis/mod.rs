// Analysis module
pub mod engine;
pub mod fallback;
pub mod prompt;
pub mod repair;
pub mod report;

pub use engine::{Adjustment, AnalysisOutcome, DegradedReason, RecommendationEngine};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use repair::extract_json;
