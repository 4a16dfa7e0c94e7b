// cloudopt library crate
// Exposes modules for the binary and integration testing

pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod output;
pub mod source;
pub mod storage;
pub mod sync;
