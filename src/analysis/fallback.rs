//! Rule-based recommendations used when the model endpoint is unavailable.
//!
//! Thresholds are fixed; compute resources are matched against the tighter
//! CPU threshold first so a resource lands in exactly one rule.

use crate::models::money;
use crate::models::{
    ComputeResource, ImplementationEffort, Priority, Recommendation, RecommendationSet,
    ResourceType, RiskLevel, StorageResource, UsageData,
};

const SEVERE_CPU_THRESHOLD: f64 = 5.0;
const LOW_CPU_THRESHOLD: f64 = 20.0;
const HIGH_PRIORITY_CPU_THRESHOLD: f64 = 10.0;
const COLD_STORAGE_MIN_COST: f64 = 10.0;

const SEVERE_CPU_SAVINGS_RATE: f64 = 0.8;
const DOWNSIZE_SAVINGS_RATE: f64 = 0.4;
const COLD_STORAGE_SAVINGS_RATE: f64 = 0.7;

/// Generate recommendations from usage metrics alone.
pub fn generate(usage: &UsageData) -> RecommendationSet {
    let recommendations: Vec<Recommendation> = usage
        .compute
        .iter()
        .filter_map(evaluate_compute)
        .chain(usage.storage.iter().filter_map(evaluate_storage))
        .collect();

    let summary = format!(
        "Found {} optimization opportunities using rule-based analysis",
        recommendations.len()
    );
    let insights = vec![
        "Analysis performed using rule-based fallback (model API unavailable)".to_string(),
        format!("Total {} compute resources analyzed", usage.compute.len()),
        format!("Total {} storage resources analyzed", usage.storage.len()),
    ];

    RecommendationSet::new(summary, recommendations, insights)
}

fn evaluate_compute(compute: &ComputeResource) -> Option<Recommendation> {
    // No CPU metric, no evidence of underutilization
    let cpu_avg = compute.cpu_usage_avg?;
    let cost = compute.cost_per_month;
    let current_state = format!(
        "CPU: {}% avg, Cost: {}/month",
        cpu_avg,
        money::format_amount(cost)
    );

    if cpu_avg < SEVERE_CPU_THRESHOLD {
        Some(Recommendation {
            resource_id: resource_id(&compute.resource_id),
            resource_type: ResourceType::Compute,
            issue: format!("Severely underutilized instance (CPU: {}%)", cpu_avg),
            current_state,
            action: "Stop instance or migrate to serverless".to_string(),
            estimated_savings: money::round_cents(cost * SEVERE_CPU_SAVINGS_RATE),
            risk: RiskLevel::Low,
            priority: Priority::High,
            implementation_effort: ImplementationEffort::Medium,
        })
    } else if cpu_avg < LOW_CPU_THRESHOLD {
        let priority = if cpu_avg < HIGH_PRIORITY_CPU_THRESHOLD {
            Priority::High
        } else {
            Priority::Medium
        };

        Some(Recommendation {
            resource_id: resource_id(&compute.resource_id),
            resource_type: ResourceType::Compute,
            issue: format!("CPU usage below 20% (avg: {}%)", cpu_avg),
            current_state,
            action: "Downsize machine type to match actual usage".to_string(),
            estimated_savings: money::round_cents(cost * DOWNSIZE_SAVINGS_RATE),
            risk: RiskLevel::Low,
            priority,
            implementation_effort: ImplementationEffort::Low,
        })
    } else {
        None
    }
}

fn evaluate_storage(storage: &StorageResource) -> Option<Recommendation> {
    let access_frequency = storage
        .access_frequency
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let cost = storage.cost_per_month;

    if access_frequency != "low" || cost <= COLD_STORAGE_MIN_COST {
        return None;
    }

    Some(Recommendation {
        resource_id: resource_id(&storage.resource_id),
        resource_type: ResourceType::Storage,
        issue: "Low access frequency storage using expensive tier".to_string(),
        current_state: format!(
            "Access: {}, Cost: {}/month",
            access_frequency,
            money::format_amount(cost)
        ),
        action: "Move to cold storage tier (Nearline/Coldline)".to_string(),
        estimated_savings: money::round_cents(cost * COLD_STORAGE_SAVINGS_RATE),
        risk: RiskLevel::Low,
        priority: Priority::Medium,
        implementation_effort: ImplementationEffort::Low,
    })
}

fn resource_id(id: &str) -> String {
    if id.trim().is_empty() {
        "unknown".to_string()
    } else {
        id.to_string()
    }
}
