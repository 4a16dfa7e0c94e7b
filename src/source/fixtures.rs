//! Fixture data served by `MockCloud`.

use crate::models::cloud::{CostBreakdown, CostDriver, CostTrend, TimeRange};
use crate::models::{
    BillingData, ComputeResource, NetworkUsage, OptimizationRule, ResourceType, RiskLevel,
    StorageResource, UsageData,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

type Window = (DateTime<Utc>, DateTime<Utc>);

fn time_range((start, end): Window) -> Option<TimeRange> {
    Some(TimeRange {
        start: start.to_rfc3339(),
        end: end.to_rfc3339(),
    })
}

#[allow(clippy::too_many_arguments)]
fn vm(
    resource_id: String,
    instance_type: &str,
    region: &str,
    cpu_avg: f64,
    cpu_max: f64,
    memory_avg: f64,
    egress_gb: f64,
    uptime: f64,
    cost: f64,
) -> ComputeResource {
    ComputeResource {
        resource_id,
        instance_type: Some(instance_type.to_string()),
        region: Some(region.to_string()),
        cpu_usage_avg: Some(cpu_avg),
        cpu_usage_max: Some(cpu_max),
        memory_usage_avg: Some(memory_avg),
        network_egress_gb: Some(egress_gb),
        uptime_percentage: Some(uptime),
        cost_per_month: cost,
        ..Default::default()
    }
}

fn bucket(resource_id: String, size_gb: f64, access_frequency: &str, cost: f64) -> StorageResource {
    StorageResource {
        resource_id,
        storage_type: Some("standard".to_string()),
        size_gb: Some(size_gb),
        access_frequency: Some(access_frequency.to_string()),
        cost_per_month: cost,
        ..Default::default()
    }
}

pub fn usage(provider: &str, window: Window) -> UsageData {
    UsageData {
        provider: provider.to_string(),
        time_range: time_range(window),
        compute: vec![
            vm(format!("vm-prod-{provider}-01"), "n1-standard-4", "us-central1", 15.5, 45.2, 32.1, 125.3, 99.8, 150.0),
            vm(format!("vm-dev-{provider}-02"), "n1-standard-2", "us-east1", 3.2, 8.5, 12.5, 2.1, 45.2, 75.0),
            vm(format!("vm-staging-{provider}-03"), "n1-standard-8", "us-west1", 65.8, 92.3, 78.5, 450.2, 100.0, 300.0),
        ],
        storage: vec![
            bucket(format!("bucket-{provider}-data-01"), 1250.5, "high", 25.5),
            bucket(format!("bucket-{provider}-archive-02"), 850.2, "low", 17.0),
        ],
        network: Some(NetworkUsage {
            total_egress_gb: 577.6,
            total_ingress_gb: 1200.3,
            cost_per_month: 45.2,
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn billing(provider: &str, window: Window) -> BillingData {
    let mut breakdown = BTreeMap::new();
    breakdown.insert(
        "compute".to_string(),
        CostBreakdown { cost: 525.0, percentage: 85.7, resources: Some(3) },
    );
    breakdown.insert(
        "storage".to_string(),
        CostBreakdown { cost: 42.5, percentage: 6.9, resources: Some(2) },
    );
    breakdown.insert(
        "network".to_string(),
        CostBreakdown { cost: 45.2, percentage: 7.4, resources: None },
    );

    let driver = |resource_id: String, cost: f64, category: &str| CostDriver {
        resource_id,
        cost,
        category: category.to_string(),
    };

    BillingData {
        provider: provider.to_string(),
        time_range: time_range(window),
        total_cost: 612.70,
        currency: "USD".to_string(),
        breakdown,
        trend: Some(CostTrend {
            previous_period_cost: 650.0,
            change_percentage: -5.7,
            change_direction: "decreasing".to_string(),
        }),
        top_cost_drivers: vec![
            driver(format!("vm-staging-{provider}-03"), 300.0, "compute"),
            driver(format!("vm-prod-{provider}-01"), 150.0, "compute"),
            driver("network-egress".to_string(), 45.2, "network"),
        ],
        ..Default::default()
    }
}

fn rule(
    rule_id: &str,
    resource_type: ResourceType,
    condition: &str,
    recommendation: &str,
    risk_level: RiskLevel,
    estimated_savings_percentage: u32,
) -> OptimizationRule {
    OptimizationRule {
        rule_id: rule_id.to_string(),
        resource_type,
        condition: condition.to_string(),
        recommendation: recommendation.to_string(),
        risk_level,
        estimated_savings_percentage,
    }
}

pub fn rules(resource_type: ResourceType) -> Vec<OptimizationRule> {
    use ResourceType::*;
    use RiskLevel::*;

    match resource_type {
        Compute => vec![
            rule("cpu_underutilization", Compute, "cpu_usage < 20", "Downsize VM instance", Low, 30),
            rule(
                "idle_instance",
                Compute,
                "cpu_usage < 5 AND network_egress < 1MB",
                "Stop or terminate idle instance",
                Medium,
                100,
            ),
            rule(
                "reserved_instance_eligible",
                Compute,
                "constant_load AND uptime > 80%",
                "Purchase reserved instance",
                Low,
                40,
            ),
        ],
        Storage => vec![
            rule(
                "cold_storage_eligible",
                Storage,
                "access_frequency < 1_per_month",
                "Move to cold storage tier",
                Low,
                70,
            ),
            rule(
                "orphaned_snapshots",
                Storage,
                "snapshot_age > 90_days AND no_attached_volumes",
                "Delete orphaned snapshots",
                Low,
                100,
            ),
        ],
        Network => vec![rule(
            "high_egress_cost",
            Network,
            "egress_cost > 30%_of_total",
            "Optimize data transfer routing",
            Medium,
            25,
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_billing_breakdown_matches_total() {
        let now = Utc::now();
        let billing = billing("gcp", (now - Duration::days(30), now));

        let sum: f64 = billing.breakdown.values().map(|b| b.cost).sum();
        assert!((sum - billing.total_cost).abs() < 0.01);
        assert_eq!(billing.top_cost_drivers[0].resource_id, "vm-staging-gcp-03");
        assert!(billing.time_range.is_some());
    }

    #[test]
    fn test_rules_carry_their_resource_type() {
        for resource_type in ResourceType::ALL {
            assert!(rules(*resource_type).iter().all(|r| r.resource_type == *resource_type));
        }
    }
}
