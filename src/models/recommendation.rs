//! Recommendation domain types and their wire form.

use crate::models::money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a lowercase string enum with `FromStr`, `Display` and `as_str`.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            /// Case-insensitive, ignores surrounding whitespace
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!(
                        "Invalid {}: {}. Must be one of: {}",
                        stringify!($name),
                        s,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

string_enum!(
    /// Cloud resource category a recommendation targets
    ResourceType { Compute => "compute", Storage => "storage", Network => "network" }
);

string_enum!(
    RiskLevel { Low => "low", Medium => "medium", High => "high" }
);

string_enum!(
    Priority { High => "high", Medium => "medium", Low => "low" }
);

string_enum!(
    ImplementationEffort { Low => "low", Medium => "medium", High => "high" }
);

string_enum!(
    /// Review state of a stored recommendation. `Approved` and `Rejected` are terminal.
    RecommendationStatus { Pending => "pending", Approved => "approved", Rejected => "rejected" }
);

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Low
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Default for ImplementationEffort {
    fn default() -> Self {
        ImplementationEffort::Low
    }
}

impl Default for RecommendationStatus {
    fn default() -> Self {
        RecommendationStatus::Pending
    }
}

/// A single optimization suggestion tied to one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub issue: String,
    pub current_state: String,
    pub action: String,
    #[serde(with = "money::wire")]
    pub estimated_savings: f64,
    pub risk: RiskLevel,
    pub priority: Priority,
    pub implementation_effort: ImplementationEffort,
}

/// Top-level result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub summary: String,
    #[serde(with = "money::wire")]
    pub total_potential_savings: f64,
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl RecommendationSet {
    /// Build a set whose total is computed from `recommendations`.
    pub fn new(summary: String, recommendations: Vec<Recommendation>, insights: Vec<String>) -> Self {
        let mut set = Self {
            summary,
            total_potential_savings: 0.0,
            recommendations,
            insights,
            error: false,
        };
        set.recalculate_total();
        set
    }

    /// A failed run: no recommendations, zero savings, `error` set.
    pub fn degraded(summary: String, insights: Vec<String>) -> Self {
        Self {
            summary,
            total_potential_savings: 0.0,
            recommendations: Vec::new(),
            insights,
            error: true,
        }
    }

    /// Recompute `total_potential_savings` from the itemized list.
    pub fn recalculate_total(&mut self) {
        let total: f64 = self
            .recommendations
            .iter()
            .map(|rec| rec.estimated_savings)
            .sum();
        self.total_potential_savings = money::round_cents(total);
    }

    pub fn push(&mut self, recommendation: Recommendation) {
        self.recommendations.push(recommendation);
        self.recalculate_total();
    }
}
