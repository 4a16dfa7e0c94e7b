//! Recommendation engine: prompt the model, recover its output, validate it.
//!
//! `analyze` never fails. Every failure is turned into either the rule-based
//! fallback set or a degraded set flagged with `error`.

use crate::analysis::{fallback, prompt, repair};
use crate::error::{ModelError, MoneyError, ValidationError};
use crate::llm::ModelClient;
use crate::models::money;
use crate::models::{
    BillingData, ImplementationEffort, OptimizationRule, Priority, Recommendation,
    RecommendationSet, ResourceType, RiskLevel, UsageData,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Why a run produced a degraded set
#[derive(Debug, Clone, PartialEq)]
pub enum DegradedReason {
    MalformedResponse(String),
    ModelFailure(ModelError),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::MalformedResponse(e) => write!(f, "malformed model response: {}", e),
            DegradedReason::ModelFailure(e) => write!(f, "model call failed: {}", e),
        }
    }
}

/// A field the engine corrected or a recommendation it dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub index: usize,
    pub resource_id: Option<String>,
    pub error: ValidationError,
    pub dropped: bool,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.resource_id.as_deref().unwrap_or("<unnamed>");
        let outcome = if self.dropped { "dropped" } else { "normalized to default" };
        write!(f, "recommendation #{} ({}): {}, {}", self.index, target, self.error, outcome)
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed {
        set: RecommendationSet,
        adjustments: Vec<Adjustment>,
    },
    Fallback(RecommendationSet),
    Degraded {
        set: RecommendationSet,
        reason: DegradedReason,
    },
}

impl AnalysisOutcome {
    pub fn set(&self) -> &RecommendationSet {
        match self {
            AnalysisOutcome::Completed { set, .. } => set,
            AnalysisOutcome::Fallback(set) => set,
            AnalysisOutcome::Degraded { set, .. } => set,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }

    /// Label stored with a persisted session
    pub fn source(&self) -> &'static str {
        match self {
            AnalysisOutcome::Completed { .. } => "model",
            AnalysisOutcome::Fallback(_) => "fallback",
            AnalysisOutcome::Degraded { .. } => "degraded",
        }
    }
}

/// Lenient shape of the model's JSON. Only the top level is typed; each
/// recommendation stays a raw value so one bad item never rejects the rest.
#[derive(Debug, Deserialize)]
struct RawRecommendationSet {
    #[serde(default)]
    summary: Option<Value>,
    #[serde(default)]
    recommendations: Option<Vec<Value>>,
    #[serde(default)]
    insights: Option<Value>,
}

pub struct RecommendationEngine<C: ModelClient> {
    client: C,
}

impl<C: ModelClient> RecommendationEngine<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn analyze(
        &self,
        usage: &UsageData,
        billing: &BillingData,
        rules: Option<&[OptimizationRule]>,
    ) -> AnalysisOutcome {
        let prompt = prompt::build_prompt(usage, billing, rules);

        let response = match self.client.generate(prompt::SYSTEM_PROMPT, &prompt).await {
            Ok(response) => response,
            Err(ModelError::Unavailable(_)) => return AnalysisOutcome::Fallback(fallback::generate(usage)),
            Err(e) => {
                let set = RecommendationSet::degraded(format!("Error during analysis: {}", e), Vec::new());
                return AnalysisOutcome::Degraded {
                    set,
                    reason: DegradedReason::ModelFailure(e),
                };
            }
        };

        match decode_response(&response) {
            Ok(raw) => {
                let (set, adjustments) = validate(raw);
                AnalysisOutcome::Completed { set, adjustments }
            }
            Err(message) => AnalysisOutcome::Degraded {
                set: RecommendationSet::degraded(
                    "Error parsing AI response".to_string(),
                    vec![format!("Failed to parse AI response: {}", message)],
                ),
                reason: DegradedReason::MalformedResponse(message),
            },
        }
    }
}

/// Direct parse first, repair parser second, then the typed decode.
fn decode_response(response: &str) -> Result<RawRecommendationSet, String> {
    let value = match serde_json::from_str::<Value>(response.trim()) {
        Ok(value) if value.is_object() => value,
        _ => repair::extract_json(response).map_err(|e| e.to_string())?,
    };

    serde_json::from_value(value).map_err(|e| format!("Unexpected response shape: {}", e))
}

fn validate(raw: RawRecommendationSet) -> (RecommendationSet, Vec<Adjustment>) {
    let items = raw.recommendations.unwrap_or_default();
    let mut adjustments = Vec::new();
    let mut recommendations = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match validate_recommendation(item) {
            Ok((rec, corrections)) => {
                adjustments.extend(corrections.into_iter().map(|error| Adjustment {
                    index,
                    resource_id: Some(rec.resource_id.clone()),
                    error,
                    dropped: false,
                }));
                recommendations.push(rec);
            }
            Err((resource_id, error)) => adjustments.push(Adjustment {
                index,
                resource_id,
                error,
                dropped: true,
            }),
        }
    }

    let insights = match raw.insights {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|insight| !insight.is_null())
            .map(|insight| text_of(Some(insight)))
            .collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text],
        _ => Vec::new(),
    };

    let set = RecommendationSet::new(text_of(raw.summary.as_ref()), recommendations, insights);
    (set, adjustments)
}

type Rejection = (Option<String>, ValidationError);

fn validate_recommendation(item: Value) -> Result<(Recommendation, Vec<ValidationError>), Rejection> {
    let fields = match item {
        Value::Object(fields) => fields,
        other => {
            let error = ValidationError::WrongType {
                field: "recommendation",
                value: other.to_string(),
            };
            return Err((None, error));
        }
    };

    let resource_id = match fields.get("resource_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            return Err((None, ValidationError::MissingResourceId));
        }
        Some(other) => {
            let error = ValidationError::WrongType {
                field: "resource_id",
                value: other.to_string(),
            };
            return Err((None, error));
        }
    };

    let parsed_type = match fields.get("resource_type") {
        Some(Value::String(text)) => text.parse::<ResourceType>().map_err(|_| text.clone()),
        Some(other) => Err(other.to_string()),
        None => Err(String::new()),
    };
    let resource_type = match parsed_type {
        Ok(resource_type) => resource_type,
        Err(value) => {
            let error = ValidationError::InvalidEnum {
                field: "resource_type",
                value,
            };
            return Err((Some(resource_id), error));
        }
    };

    let estimated_savings = match parse_savings(fields.get("estimated_savings")) {
        Ok(amount) => amount,
        Err(error) => return Err((Some(resource_id), error)),
    };

    let mut corrections = Vec::new();
    let risk = enum_or_default::<RiskLevel>(&fields, "risk", &mut corrections);
    let priority = enum_or_default::<Priority>(&fields, "priority", &mut corrections);
    let implementation_effort =
        enum_or_default::<ImplementationEffort>(&fields, "implementation_effort", &mut corrections);

    let recommendation = Recommendation {
        resource_id,
        resource_type,
        issue: text_of(fields.get("issue")),
        current_state: text_of(fields.get("current_state")),
        action: text_of(fields.get("action")),
        estimated_savings,
        risk,
        priority,
        implementation_effort,
    };
    Ok((recommendation, corrections))
}

/// Savings arrive as a currency string or, from some models, a bare number.
fn parse_savings(value: Option<&Value>) -> Result<f64, ValidationError> {
    let amount = match value {
        Some(Value::String(text)) => money::parse(text)?,
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| MoneyError::InvalidMonetaryFormat(number.to_string()))?,
        Some(other) => money::parse(&other.to_string())?,
        None => money::parse("")?,
    };
    Ok(money::checked_savings(amount)?)
}

fn enum_or_default<T>(fields: &Map<String, Value>, field: &'static str, corrections: &mut Vec<ValidationError>) -> T
where
    T: FromStr + Default,
{
    let value = match fields.get(field) {
        None | Some(Value::Null) => return T::default(),
        Some(Value::String(text)) => match text.parse() {
            Ok(parsed) => return parsed,
            Err(_) => text.clone(),
        },
        Some(other) => other.to_string(),
    };
    corrections.push(ValidationError::InvalidEnum { field, value });
    T::default()
}

/// Free text from a JSON value; null or missing is empty
fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from(value: Value) -> RawRecommendationSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_plain_json() {
        let raw = decode_response(r#"{"summary": "ok", "recommendations": []}"#).unwrap();
        assert_eq!(raw.summary, Some(json!("ok")));
    }

    #[test]
    fn test_decode_uses_repair_parser() {
        let raw = decode_response("Here you go:\n```json\n{\"summary\": \"fenced\"}\n```").unwrap();
        assert_eq!(raw.summary, Some(json!("fenced")));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode_response(r#"{"recommendations": "none"}"#).unwrap_err();
        assert!(err.starts_with("Unexpected response shape"));
    }

    #[test]
    fn test_validate_ignores_model_total() {
        let (set, adjustments) = validate(raw_from(json!({
            "summary": "two findings",
            "total_potential_savings": "$9999.00/month",
            "recommendations": [
                {"resource_id": "vm-1", "resource_type": "compute", "estimated_savings": "$60.00/month",
                 "risk": "low", "priority": "high", "implementation_effort": "low"},
                {"resource_id": "bucket-1", "resource_type": "Storage", "estimated_savings": 11.9,
                 "risk": "LOW", "priority": "medium", "implementation_effort": "low"}
            ],
            "insights": ["a", 3]
        })));

        assert!(adjustments.is_empty());
        assert_eq!(set.recommendations.len(), 2);
        assert_eq!(set.total_potential_savings, 71.9);
        assert_eq!(set.recommendations[1].resource_type, ResourceType::Storage);
        assert_eq!(set.insights, vec!["a".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_validate_normalizes_bad_enums() {
        let (set, adjustments) = validate(raw_from(json!({
            "recommendations": [
                {"resource_id": "vm-1", "resource_type": "compute", "estimated_savings": "$10/month",
                 "risk": "extreme", "priority": "urgent"}
            ]
        })));

        let rec = &set.recommendations[0];
        assert_eq!(rec.risk, RiskLevel::Low);
        assert_eq!(rec.priority, Priority::Medium);
        assert_eq!(rec.implementation_effort, ImplementationEffort::Low);
        assert_eq!(adjustments.len(), 2);
        assert!(adjustments.iter().all(|a| !a.dropped));
    }

    #[test]
    fn test_validate_drops_unusable_recommendations() {
        let (set, adjustments) = validate(raw_from(json!({
            "recommendations": [
                {"resource_type": "compute", "estimated_savings": "$10/month"},
                {"resource_id": "db-1", "resource_type": "database", "estimated_savings": "$10/month"},
                {"resource_id": "vm-2", "resource_type": "compute", "estimated_savings": "lots"},
                {"resource_id": "vm-3", "resource_type": "compute", "estimated_savings": "$5.5/month"}
            ]
        })));

        assert_eq!(set.recommendations.len(), 1);
        assert_eq!(set.recommendations[0].resource_id, "vm-3");
        assert_eq!(set.total_potential_savings, 5.5);

        assert_eq!(adjustments.len(), 3);
        assert!(adjustments.iter().all(|a| a.dropped));
        assert_eq!(adjustments[0].error, ValidationError::MissingResourceId);
        assert_eq!(adjustments[1].resource_id.as_deref(), Some("db-1"));
        assert!(matches!(adjustments[2].error, ValidationError::InvalidSavings(_)));
    }

    #[test]
    fn test_wrong_typed_item_does_not_sink_the_set() {
        let raw = decode_response(
            r#"{
                "summary": null,
                "recommendations": [
                    {"resource_id": "vm-1", "resource_type": "compute", "estimated_savings": "$60.00/month",
                     "risk": "low", "priority": "high", "implementation_effort": "low"},
                    {"resource_id": "vm-2", "resource_type": "compute", "estimated_savings": "$20.00/month",
                     "risk": "low", "priority": 1, "implementation_effort": ["low"]},
                    {"resource_id": 42, "resource_type": "compute", "estimated_savings": "$5.00/month"},
                    {"resource_id": "vm-4", "resource_type": 3, "estimated_savings": "$5.00/month"},
                    null,
                    "vm-6"
                ],
                "insights": null
            }"#,
        )
        .unwrap();
        let (set, adjustments) = validate(raw);

        assert_eq!(set.summary, "");
        assert!(set.insights.is_empty());
        assert_eq!(set.recommendations.len(), 2);
        assert_eq!(set.recommendations[1].resource_id, "vm-2");
        assert_eq!(set.recommendations[1].priority, Priority::Medium);
        assert_eq!(set.recommendations[1].implementation_effort, ImplementationEffort::Low);
        assert_eq!(set.total_potential_savings, 80.0);

        let normalized: Vec<_> = adjustments.iter().filter(|a| !a.dropped).collect();
        assert_eq!(normalized.len(), 2);
        assert_eq!(
            normalized[0].error,
            ValidationError::InvalidEnum { field: "priority", value: "1".to_string() }
        );

        let dropped: Vec<_> = adjustments.iter().filter(|a| a.dropped).map(|a| a.index).collect();
        assert_eq!(dropped, vec![2, 3, 4, 5]);
        assert_eq!(
            adjustments[2].error,
            ValidationError::WrongType { field: "resource_id", value: "42".to_string() }
        );
    }

    #[test]
    fn test_out_of_range_savings_are_dropped() {
        let (set, adjustments) = validate(raw_from(json!({
            "recommendations": [
                {"resource_id": "vm-1", "resource_type": "compute", "estimated_savings": 1.7e308},
                {"resource_id": "vm-2", "resource_type": "compute", "estimated_savings": "$-5.00/month"},
                {"resource_id": "vm-3", "resource_type": "compute", "estimated_savings": "$12.50/month"}
            ]
        })));

        assert_eq!(set.recommendations.len(), 1);
        assert_eq!(set.total_potential_savings, 12.5);
        assert_eq!(adjustments.len(), 2);
        assert!(adjustments
            .iter()
            .all(|a| a.dropped && matches!(a.error, ValidationError::InvalidSavings(MoneyError::OutOfRange(_)))));

        // the surviving set still serializes to parseable money
        let wire = serde_json::to_value(&set).unwrap();
        let amount = wire["total_potential_savings"].as_str().unwrap();
        assert_eq!(money::parse(amount).unwrap(), 12.5);
    }

    #[test]
    fn test_adjustment_display() {
        let adjustment = Adjustment {
            index: 2,
            resource_id: Some("vm-9".to_string()),
            error: ValidationError::InvalidEnum { field: "risk", value: "extreme".to_string() },
            dropped: false,
        };
        assert_eq!(
            adjustment.to_string(),
            "recommendation #2 (vm-9): invalid risk value \"extreme\", normalized to default"
        );
    }
}
