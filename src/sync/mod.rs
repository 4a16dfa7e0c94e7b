// Export of stored recommendations
pub mod export;

pub use export::{ExportDocument, ExportFormat, ExportManager, ExportSummary};
