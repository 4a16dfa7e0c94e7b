// CLI definitions
pub mod args;

pub use args::{AnalyzeArgs, Cli, Commands, ConfigAction};
