//! Usage, billing and rule sources.
//!
//! `MockCloud` serves fixture data shaped like a provider's monitoring and
//! billing exports. A [`CloudContext`] owned by the caller can replace the
//! fixtures with data loaded from elsewhere (for example JSON files).

pub mod fixtures;

use crate::models::{BillingData, OptimizationRule, ResourceType, UsageData};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::Path;

pub const SUPPORTED_PROVIDERS: &[&str] = &["gcp", "aws", "azure"];

/// Where the pipeline gets its input data
pub trait CloudDataSource {
    fn usage(&self, provider: &str, time_range: &str, resource_type: Option<ResourceType>) -> Result<UsageData>;
    fn billing(&self, provider: &str, time_range: &str) -> Result<BillingData>;
    fn rules(&self, resource_type: ResourceType) -> Result<Vec<OptimizationRule>>;
}

/// Caller-owned override for usage and billing data
#[derive(Debug, Clone, Default)]
pub struct CloudContext {
    usage: Option<UsageData>,
    billing: Option<BillingData>,
    updated_at: Option<DateTime<Utc>>,
}

impl CloudContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, usage: Option<UsageData>, billing: Option<BillingData>) {
        if usage.is_some() {
            self.usage = usage;
        }
        if billing.is_some() {
            self.billing = billing;
        }
        self.updated_at = Some(Utc::now());
    }

    /// Load usage and/or billing JSON files into the context
    pub fn load_files(&mut self, usage_path: Option<&Path>, billing_path: Option<&Path>) -> Result<()> {
        let usage = usage_path.map(read_json::<UsageData>).transpose()?;
        let billing = billing_path.map(read_json::<BillingData>).transpose()?;
        if usage.is_some() || billing.is_some() {
            self.update(usage, billing);
        }
        Ok(())
    }

    pub fn usage(&self) -> Option<&UsageData> {
        self.usage.as_ref()
    }

    pub fn billing(&self) -> Option<&BillingData> {
        self.billing.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse data file: {}", path.display()))
}

/// Fixture-backed data source
#[derive(Debug, Clone, Default)]
pub struct MockCloud {
    context: CloudContext,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: CloudContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CloudContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut CloudContext {
        &mut self.context
    }
}

impl CloudDataSource for MockCloud {
    fn usage(&self, provider: &str, time_range: &str, resource_type: Option<ResourceType>) -> Result<UsageData> {
        validate_provider(provider)?;

        let usage = match self.context.usage() {
            Some(usage) => usage.clone(),
            None => fixtures::usage(provider, resolve_time_range(time_range, Utc::now())),
        };
        Ok(filter_usage(usage, resource_type))
    }

    fn billing(&self, provider: &str, time_range: &str) -> Result<BillingData> {
        validate_provider(provider)?;

        Ok(match self.context.billing() {
            Some(billing) => billing.clone(),
            None => fixtures::billing(provider, resolve_time_range(time_range, Utc::now())),
        })
    }

    fn rules(&self, resource_type: ResourceType) -> Result<Vec<OptimizationRule>> {
        Ok(fixtures::rules(resource_type))
    }
}

fn validate_provider(provider: &str) -> Result<()> {
    if !SUPPORTED_PROVIDERS.contains(&provider) {
        bail!(
            "Invalid provider: {}. Must be one of: {}",
            provider,
            SUPPORTED_PROVIDERS.join(", ")
        );
    }
    Ok(())
}

/// Start and end of a named window ending at `now`. Unknown names mean 30 days.
pub fn resolve_time_range(time_range: &str, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days = match time_range {
        "last_7_days" => 7,
        _ => 30,
    };
    (now - Duration::days(days), now)
}

fn filter_usage(usage: UsageData, resource_type: Option<ResourceType>) -> UsageData {
    let Some(resource_type) = resource_type else {
        return usage;
    };

    UsageData {
        provider: usage.provider,
        compute: if resource_type == ResourceType::Compute { usage.compute } else { Vec::new() },
        storage: if resource_type == ResourceType::Storage { usage.storage } else { Vec::new() },
        network: if resource_type == ResourceType::Network { usage.network } else { None },
        ..Default::default()
    }
}
