use crate::models::money;
use crate::models::RecommendationSet;

/// Human-readable report of a recommendation set.
pub fn summarize(set: &RecommendationSet) -> String {
    if set.error {
        return format!("[ERROR] {}", set.summary);
    }

    let mut lines = vec![
        format!("[SUMMARY] {}", set.summary),
        format!(
            "[SAVINGS] Total Potential Savings: {}",
            money::format(set.total_potential_savings)
        ),
        String::new(),
        format!("[FOUND] {} optimization opportunities:", set.recommendations.len()),
        String::new(),
    ];

    for (i, rec) in set.recommendations.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, rec.resource_id));
        lines.push(format!("   Issue: {}", rec.issue));
        lines.push(format!("   Action: {}", rec.action));
        lines.push(format!(
            "   Savings: {} | Risk: {}",
            money::format(rec.estimated_savings),
            rec.risk.as_str().to_uppercase()
        ));
        lines.push(String::new());
    }

    if !set.insights.is_empty() {
        lines.push("[INSIGHTS] Additional Insights:".to_string());
        lines.extend(set.insights.iter().map(|insight| format!("   - {}", insight)));
    }

    lines.join("\n")
}
