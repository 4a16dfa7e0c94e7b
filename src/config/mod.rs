pub mod settings;

pub use settings::{Config, LoggingConfig, ModelConfig, OutputConfig, SourceConfig, StorageConfig};
