use cloudopt::analysis::{AnalysisOutcome, DegradedReason, RecommendationEngine};
use cloudopt::commands::{record_outcome, run_analysis, AnalysisRequest};
use cloudopt::llm::{ModelClient, ModelError};
use cloudopt::models::{Priority, RecommendationStatus, ResourceType, RiskLevel};
use cloudopt::source::MockCloud;
use cloudopt::storage::{Database, Transition};
use std::sync::Mutex;
use tempfile::TempDir;

/// Replays canned responses and records the prompts it was given
struct ScriptedClient {
    response: Result<String, ModelError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(response: Result<&str, ModelError>) -> Self {
        Self {
            response: response.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ModelClient for ScriptedClient {
    async fn generate(&self, _system_prompt: &str, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone()
    }
}

fn request() -> AnalysisRequest {
    AnalysisRequest {
        provider: "gcp".to_string(),
        time_range: "last_30_days".to_string(),
        rule_types: ResourceType::ALL.to_vec(),
    }
}

fn setup_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("pipeline.db")).unwrap();
    (temp_dir, db)
}

const MODEL_RESPONSE: &str = r#"Here is my analysis:
```json
{
  "summary": "Two resources can be optimized",
  "total_potential_savings": "$999.00/month",
  "recommendations": [
    {"resource_id": "vm-dev-gcp-02", "resource_type": "compute", "issue": "Idle",
     "current_state": "CPU 3.2%", "action": "Stop instance", "estimated_savings": "$60.00/month",
     "risk": "LOW", "priority": "high", "implementation_effort": "medium"},
    {"resource_id": "bucket-gcp-archive-02", "resource_type": "storage", "issue": "Cold data",
     "current_state": "standard tier", "action": "Move to coldline", "estimated_savings": "$11.90/month",
     "risk": "minimal", "priority": "medium", "implementation_effort": "low"},
    {"resource_id": "", "resource_type": "network", "issue": "?", "current_state": "?",
     "action": "?", "estimated_savings": "$5.00/month", "risk": "low", "priority": "low",
     "implementation_effort": "low"}
  ],
  "insights": ["Dev VMs run around the clock"]
}
```"#;

#[tokio::test]
async fn test_model_response_is_repaired_validated_and_saved() {
    let client = ScriptedClient::new(Ok(MODEL_RESPONSE));
    let engine = RecommendationEngine::new(client);
    let outcome = run_analysis(&engine, &MockCloud::new(), &request()).await.unwrap();

    let AnalysisOutcome::Completed { set, adjustments } = &outcome else {
        panic!("expected completed outcome, got {:?}", outcome);
    };

    // empty resource_id dropped, unknown risk normalized
    assert_eq!(set.recommendations.len(), 2);
    assert_eq!(adjustments.len(), 2);
    assert_eq!(set.recommendations[0].risk, RiskLevel::Low);
    assert_eq!(set.recommendations[0].priority, Priority::High);
    assert_eq!(set.recommendations[1].risk, RiskLevel::Low);
    // the model's own total is ignored
    assert_eq!(set.total_potential_savings, 71.9);

    let (_dir, db) = setup_db();
    let session_id = record_outcome(&outcome, Some(&db)).unwrap().unwrap();
    let sessions = db.list_sessions(10).unwrap();
    assert_eq!(sessions[0].id, session_id);
    assert_eq!(sessions[0].source, "model");
}

#[tokio::test]
async fn test_prompt_carries_fixture_data_and_rules() {
    let client = ScriptedClient::new(Ok(MODEL_RESPONSE));
    let engine = RecommendationEngine::new(&client);
    run_analysis(&engine, &MockCloud::new(), &request()).await.unwrap();

    let prompts = client.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("vm-staging-gcp-03"));
    assert!(prompts[0].contains("cpu_underutilization"));
    assert!(prompts[0].contains("high_egress_cost"));
}

#[tokio::test]
async fn test_unavailable_model_falls_back_to_rules() {
    let client = ScriptedClient::new(Err(ModelError::Unavailable("HTTP 404".to_string())));
    let outcome = run_analysis(&RecommendationEngine::new(client), &MockCloud::new(), &request())
        .await
        .unwrap();

    assert_eq!(outcome.source(), "fallback");
    assert!(!outcome.is_degraded());
    assert_eq!(outcome.set().total_potential_savings, 131.9);
}

#[tokio::test]
async fn test_timeout_degrades_without_saving() {
    let client = ScriptedClient::new(Err(ModelError::Timeout(30)));
    let outcome = run_analysis(&RecommendationEngine::new(client), &MockCloud::new(), &request())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        AnalysisOutcome::Degraded { reason: DegradedReason::ModelFailure(ModelError::Timeout(30)), .. }
    ));
    assert!(outcome.set().error);
    assert!(outcome.set().recommendations.is_empty());

    let (_dir, db) = setup_db();
    assert_eq!(record_outcome(&outcome, Some(&db)).unwrap(), None);
    assert_eq!(db.statistics().unwrap().total_sessions, 0);
}

#[tokio::test]
async fn test_unparseable_response_degrades() {
    let client = ScriptedClient::new(Ok("noise{\"a\":1}moretext{\"b\":2}"));
    let outcome = run_analysis(&RecommendationEngine::new(client), &MockCloud::new(), &request())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        AnalysisOutcome::Degraded { reason: DegradedReason::MalformedResponse(_), .. }
    ));
}

#[tokio::test]
async fn test_pending_list_newest_first_and_review_lifecycle() {
    let (_dir, db) = setup_db();

    let first = run_analysis(
        &RecommendationEngine::new(ScriptedClient::new(Err(ModelError::Unavailable("offline".into())))),
        &MockCloud::new(),
        &request(),
    )
    .await
    .unwrap();
    let first_session = record_outcome(&first, Some(&db)).unwrap().unwrap();

    let second = run_analysis(
        &RecommendationEngine::new(ScriptedClient::new(Ok(MODEL_RESPONSE))),
        &MockCloud::new(),
        &request(),
    )
    .await
    .unwrap();
    let second_session = record_outcome(&second, Some(&db)).unwrap().unwrap();

    let pending = db
        .list_recommendations(100, Some(RecommendationStatus::Pending), None)
        .unwrap();
    assert_eq!(pending.len(), 5);
    assert!(pending[..2].iter().all(|r| r.session_id == second_session));
    assert!(pending[2..].iter().all(|r| r.session_id == first_session));

    let approved_id = pending[0].id;
    let rejected_id = pending[1].id;
    assert_eq!(db.approve(approved_id).unwrap(), Transition::Applied);
    assert_eq!(db.approve(approved_id).unwrap(), Transition::Unchanged);
    assert_eq!(db.reject(rejected_id).unwrap(), Transition::Applied);

    let still_pending = db
        .list_recommendations(100, Some(RecommendationStatus::Pending), None)
        .unwrap();
    assert_eq!(still_pending.len(), 3);

    // 131.90 + 71.90 saved, the rejected 11.90 bucket excluded
    let stats = db.statistics().unwrap();
    assert_eq!(stats.total_recommendations, 5);
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_savings, 191.9);
    assert_eq!(stats.by_status.get("approved"), Some(&1));
    assert_eq!(stats.by_status.get("rejected"), Some(&1));
}
