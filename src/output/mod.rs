// Output module
pub mod table;

pub use table::{LogRow, OutputFormat, RecommendationRow, SessionRow, StatRow};
