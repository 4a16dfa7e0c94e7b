// Models module
pub mod cloud;
pub mod money;
pub mod recommendation;

pub use cloud::{BillingData, ComputeResource, NetworkUsage, OptimizationRule, StorageResource, UsageData};
pub use recommendation::{
    ImplementationEffort, Priority, Recommendation, RecommendationSet, RecommendationStatus,
    ResourceType, RiskLevel,
};
