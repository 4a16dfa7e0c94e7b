// Analyze command handler
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::Level;

use crate::analysis::{report, AnalysisOutcome, RecommendationEngine};
use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::llm::{GeminiClient, ModelClient, OfflineClient};
use crate::models::{BillingData, OptimizationRule, RecommendationSet, ResourceType, UsageData};
use crate::source::{CloudDataSource, MockCloud};
use crate::storage::{Database, SessionId};

/// Resolved inputs for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub provider: String,
    pub time_range: String,
    pub rule_types: Vec<ResourceType>,
}

impl AnalysisRequest {
    pub fn resolve(args: &AnalyzeArgs, config: &Config) -> Self {
        Self {
            provider: args.provider.clone().unwrap_or_else(|| config.source.provider.clone()),
            time_range: args.time_range.clone().unwrap_or_else(|| config.source.time_range.clone()),
            rule_types: args.rules.clone().unwrap_or_else(|| config.source.rules.clone()),
        }
    }
}

/// Everything the engine needs for one run
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub usage: UsageData,
    pub billing: BillingData,
    pub rules: Vec<OptimizationRule>,
}

/// Fetch usage, billing and rules from `source`
pub fn fetch_inputs<S: CloudDataSource>(source: &S, request: &AnalysisRequest) -> Result<AnalysisInputs> {
    let usage = source
        .usage(&request.provider, &request.time_range, None)
        .context("Failed to fetch usage data")?;
    let billing = source
        .billing(&request.provider, &request.time_range)
        .context("Failed to fetch billing data")?;

    let mut rules: Vec<OptimizationRule> = Vec::new();
    for resource_type in &request.rule_types {
        rules.extend(
            source
                .rules(*resource_type)
                .with_context(|| format!("Failed to fetch {} rules", resource_type))?,
        );
    }

    tracing::debug!(
        provider = request.provider.as_str(),
        compute = usage.compute.len(),
        storage = usage.storage.len(),
        rules = rules.len(),
        "Fetched analysis inputs"
    );

    Ok(AnalysisInputs { usage, billing, rules })
}

pub async fn analyze_inputs<C: ModelClient>(engine: &RecommendationEngine<C>, inputs: &AnalysisInputs) -> AnalysisOutcome {
    let rules = (!inputs.rules.is_empty()).then_some(inputs.rules.as_slice());
    engine.analyze(&inputs.usage, &inputs.billing, rules).await
}

/// Fetch inputs from `source` and run the engine on them
pub async fn run_analysis<C: ModelClient, S: CloudDataSource>(
    engine: &RecommendationEngine<C>,
    source: &S,
    request: &AnalysisRequest,
) -> Result<AnalysisOutcome> {
    let inputs = fetch_inputs(source, request)?;
    Ok(analyze_inputs(engine, &inputs).await)
}

/// Append to the database event log. A failed write is traced, never fatal.
fn record_event(
    database: Option<&Database>,
    level: Level,
    component: &str,
    message: &str,
    metadata: Option<serde_json::Value>,
) {
    let Some(database) = database else {
        return;
    };
    if let Err(e) = database.log(level, component, message, metadata.as_ref()) {
        tracing::warn!(error = %format!("{e:#}"), "Failed to write event log");
    }
}

/// Log the outcome and persist it unless it is degraded
pub fn record_outcome(outcome: &AnalysisOutcome, database: Option<&Database>) -> Result<Option<SessionId>> {
    match outcome {
        AnalysisOutcome::Completed { set, adjustments } => {
            for adjustment in adjustments {
                tracing::warn!(%adjustment, "Adjusted model recommendation");
            }
            tracing::info!(
                recommendations = set.recommendations.len(),
                adjustments = adjustments.len(),
                "Model analysis completed"
            );
        }
        AnalysisOutcome::Fallback(set) => {
            tracing::warn!(
                recommendations = set.recommendations.len(),
                "Model unavailable, used rule-based analysis"
            );
            record_event(database, Level::WARN, "engine", "Model unavailable, used rule-based analysis", None);
        }
        AnalysisOutcome::Degraded { reason, .. } => {
            tracing::error!(%reason, "Analysis degraded, result will not be saved");
            record_event(database, Level::ERROR, "engine", &format!("Analysis degraded: {}", reason), None);
            return Ok(None);
        }
    }

    let Some(database) = database else {
        return Ok(None);
    };

    let session_id = database
        .save(outcome.set(), outcome.source())
        .context("Failed to save recommendations")?;
    tracing::info!(session_id, source = outcome.source(), "Saved analysis session");
    record_event(
        Some(database),
        Level::INFO,
        "storage",
        "Saved recommendations to database",
        Some(json!({ "session_id": session_id, "source": outcome.source() })),
    );

    Ok(Some(session_id))
}

pub async fn handle_analyze_command(
    args: AnalyzeArgs,
    config: &Config,
    database: Option<&Database>,
    json_output: bool,
) -> Result<()> {
    let request = AnalysisRequest::resolve(&args, config);
    let database = if args.no_save { None } else { database };
    record_event(
        database,
        Level::INFO,
        "analyze",
        "Starting analysis session",
        Some(json!({ "provider": request.provider, "time_range": request.time_range })),
    );

    let mut source = MockCloud::new();
    source
        .context_mut()
        .load_files(args.usage_file.as_deref(), args.billing_file.as_deref())?;
    if let Some(loaded_at) = source.context().updated_at() {
        tracing::info!(%loaded_at, "Using data files in place of built-in fixtures");
    }

    let inputs = match fetch_inputs(&source, &request) {
        Ok(inputs) => inputs,
        Err(e) => {
            record_event(database, Level::ERROR, "source", &format!("{e:#}"), None);
            return Err(e);
        }
    };
    record_event(
        database,
        Level::INFO,
        "source",
        "Fetched usage and billing data",
        Some(json!({
            "compute": inputs.usage.compute.len(),
            "storage": inputs.usage.storage.len(),
            "rules": inputs.rules.len(),
        })),
    );

    let outcome = if args.offline {
        tracing::info!("Offline mode, skipping model");
        analyze_inputs(&RecommendationEngine::new(OfflineClient), &inputs).await
    } else {
        let client = GeminiClient::new(&config.model)?;
        analyze_inputs(&RecommendationEngine::new(client), &inputs).await
    };

    let session_id = record_outcome(&outcome, database)?;

    if let Some(path) = &args.output {
        write_set(outcome.set(), path)?;
    }

    if json_output {
        let json = serde_json::json!({
            "source": outcome.source(),
            "session_id": session_id,
            "result": outcome.set(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", report::summarize(outcome.set()));
        if matches!(outcome, AnalysisOutcome::Fallback(_)) {
            println!("\n(Model unavailable; recommendations come from rule-based analysis)");
        }
        if let Some(id) = session_id {
            println!("\nSaved as session {}", id);
        }
        if let Some(path) = &args.output {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn write_set(set: &RecommendationSet, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(set).context("Failed to encode recommendations")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
