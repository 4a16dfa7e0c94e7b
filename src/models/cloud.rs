//! Usage, billing and rule shapes served by a cloud data source.
//!
//! Every struct keeps unrecognized fields in `extra` so the prompt can embed
//! the source data verbatim.

use crate::models::recommendation::{ResourceType, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UsageData {
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compute: Vec<ComputeResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage: Vec<StorageResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComputeResource {
    #[serde(default)]
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage_avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_egress_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_percentage: Option<f64>,
    #[serde(default)]
    pub cost_per_month: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageResource {
    #[serde(default)]
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_frequency: Option<String>,
    #[serde(default)]
    pub cost_per_month: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkUsage {
    #[serde(default)]
    pub total_egress_gb: f64,
    #[serde(default)]
    pub total_ingress_gb: f64,
    #[serde(default)]
    pub cost_per_month: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BillingData {
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub breakdown: BTreeMap<String, CostBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<CostTrend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_cost_drivers: Vec<CostDriver>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub cost: f64,
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTrend {
    pub previous_period_cost: f64,
    pub change_percentage: f64,
    pub change_direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDriver {
    pub resource_id: String,
    pub cost: f64,
    pub category: String,
}

/// Best-practice rule handed to the model as context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRule {
    pub rule_id: String,
    pub resource_type: ResourceType,
    pub condition: String,
    pub recommendation: String,
    pub risk_level: RiskLevel,
    pub estimated_savings_percentage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_preserves_unknown_fields() {
        let raw = json!({
            "provider": "gcp",
            "compute": [{
                "resource_id": "vm-1",
                "cpu_usage_avg": 12.5,
                "cost_per_month": 100.0,
                "labels": {"team": "data"}
            }],
            "project": "acme"
        });

        let usage: UsageData = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(usage.compute[0].cpu_usage_avg, Some(12.5));
        assert_eq!(usage.compute[0].extra["labels"]["team"], "data");
        assert_eq!(usage.extra["project"], "acme");

        assert_eq!(serde_json::to_value(&usage).unwrap(), raw);
    }

    #[test]
    fn test_missing_metrics_default() {
        let usage: UsageData = serde_json::from_value(json!({
            "storage": [{"resource_id": "bucket-1"}]
        }))
        .unwrap();

        assert_eq!(usage.storage[0].cost_per_month, 0.0);
        assert!(usage.storage[0].access_frequency.is_none());
        assert!(usage.compute.is_empty());
    }

    #[test]
    fn test_billing_defaults_currency() {
        let billing: BillingData = serde_json::from_value(json!({"total_cost": 10.0})).unwrap();
        assert_eq!(billing.currency, "USD");
    }
}
