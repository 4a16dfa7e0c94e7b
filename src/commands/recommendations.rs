// Recommendation listing and review handlers
use anyhow::Result;

use crate::models::{RecommendationStatus, ResourceType};
use crate::output::OutputFormat;
use crate::storage::{Database, RecommendationId, Transition};

pub fn handle_recommendations_command(
    database: &Database,
    limit: usize,
    status: Option<RecommendationStatus>,
    resource_type: Option<ResourceType>,
    json_output: bool,
    colored: bool,
) -> Result<()> {
    let recommendations = database.list_recommendations(limit, status, resource_type)?;

    if json_output {
        println!("{}", recommendations.to_json()?);
    } else {
        println!("{}", recommendations.to_table(colored));
    }

    Ok(())
}

/// Approve (`approve = true`) or reject a recommendation and report what happened
pub fn handle_review_command(
    database: &Database,
    id: RecommendationId,
    approve: bool,
    json_output: bool,
) -> Result<()> {
    let (verb, transition) = if approve {
        ("approved", database.approve(id)?)
    } else {
        ("rejected", database.reject(id)?)
    };
    tracing::info!(id, ?transition, "Review requested");

    let (status, message) = review_message(id, verb, transition);
    if json_output {
        let json = serde_json::json!({ "status": status, "id": id, "message": message });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", message);
    }

    Ok(())
}

fn review_message(id: RecommendationId, verb: &str, transition: Transition) -> (&'static str, String) {
    match transition {
        Transition::Applied => ("success", format!("Recommendation {} {}", id, verb)),
        Transition::Unchanged => ("unchanged", format!("Recommendation {} was already {}", id, verb)),
        Transition::Refused { current } => (
            "refused",
            format!("Recommendation {} is already {} and cannot be {}", id, current, verb),
        ),
    }
}
