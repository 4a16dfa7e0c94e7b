//! Prompt construction for the optimization model.

use crate::models::{BillingData, OptimizationRule, UsageData};

/// System instruction describing the agent role and the output schema.
pub const SYSTEM_PROMPT: &str = r#"You are an autonomous Cloud Optimization AI Agent.

Objectives:
- Analyze cloud usage, billing, and performance metrics
- Identify inefficiencies and idle resources
- Recommend cost and performance optimizations
- Never violate SLAs
- Always estimate savings

Rules:
- Use only the data provided in the request
- Never hallucinate metrics
- Output STRICT JSON
- Prefer reversible, low-risk actions

Output Format (JSON only):
{
  "summary": "Brief summary of findings",
  "total_potential_savings": "$XXX.XX/month",
  "recommendations": [
    {
      "resource_id": "resource-identifier",
      "resource_type": "compute|storage|network",
      "issue": "Description of the issue",
      "current_state": "Current metrics/state",
      "action": "Recommended action",
      "estimated_savings": "$XX.XX/month",
      "risk": "low|medium|high",
      "priority": "high|medium|low",
      "implementation_effort": "low|medium|high"
    }
  ],
  "insights": [
    "Additional insights or observations"
  ]
}
"#;

const ANALYSIS_INSTRUCTIONS: &str = "
ANALYSIS STEPS:
1. Identify underutilized resources (CPU < 20%, idle instances, etc.)
2. Detect idle services and orphaned resources
3. Compare cost vs usage patterns
4. Apply optimization rules where applicable
5. Estimate monthly savings for each recommendation
6. Assess risk level for each action
7. Prioritize recommendations by impact and ease of implementation

OUTPUT REQUIREMENTS:
- Return ONLY valid JSON matching the specified format
- Include all recommendations with detailed metrics
- Calculate realistic savings estimates
- Mark risk levels appropriately
- Provide actionable insights

Begin analysis now:
";

/// Build the analysis prompt. Pure: same inputs, same text.
pub fn build_prompt(
    usage: &UsageData,
    billing: &BillingData,
    rules: Option<&[OptimizationRule]>,
) -> String {
    let mut prompt = String::from(
        "Analyze the following cloud usage and billing data to identify optimization opportunities.\n\n",
    );

    prompt.push_str("CLOUD USAGE DATA:\n");
    prompt.push_str(&to_pretty_json(usage));
    prompt.push_str("\n\nBILLING DATA:\n");
    prompt.push_str(&to_pretty_json(billing));
    prompt.push('\n');

    if let Some(rules) = rules.filter(|rules| !rules.is_empty()) {
        prompt.push_str("\nOPTIMIZATION RULES TO APPLY:\n");
        prompt.push_str(&to_pretty_json(rules));
        prompt.push('\n');
    }

    prompt.push_str(ANALYSIS_INSTRUCTIONS);
    prompt
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    // Plain data structs with string keys always serialize
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
