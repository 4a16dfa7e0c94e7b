use super::{ModelClient, ModelError};
use crate::config::ModelConfig;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ERROR_PREVIEW_CHARS: usize = 200;

/// Gemini `generateContent` REST client.
///
/// Configured model names are tried in order; a 404 for one name moves on to
/// the next, and only when every name is missing is the endpoint reported as
/// unavailable.
#[derive(Debug)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    models: Vec<String>,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("cloudopt/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            models: config.models.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn url_for(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }

    async fn generate_with_model(
        &self,
        model: &str,
        api_key: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, ModelError> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: system_prompt }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url_for(model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        tracing::debug!(model, %status, "Model responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Other(format!("Failed to decode model response: {}", e)))?;

        extract_text(body)
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> ModelError {
        if error.is_timeout() {
            ModelError::Timeout(self.timeout_secs)
        } else if error.is_connect() {
            ModelError::Unavailable(format!("Cannot connect to {}: {}", self.endpoint, error))
        } else {
            ModelError::Other(format!("Request failed: {}", error))
        }
    }
}

impl ModelClient for GeminiClient {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, ModelError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ModelError::Unavailable("GEMINI_API_KEY is not configured".to_string()));
        };

        for model in &self.models {
            match self.generate_with_model(model, api_key, system_prompt, prompt).await {
                Err(ModelError::Unavailable(reason)) => {
                    tracing::warn!(model = model.as_str(), %reason, "Model unavailable, trying next");
                }
                other => return other,
            }
        }

        Err(ModelError::Unavailable(format!(
            "No configured model is available (tried: {})",
            self.models.join(", ")
        )))
    }
}

fn classify_status(status: StatusCode, body: &str) -> ModelError {
    let preview: String = body.chars().take(ERROR_PREVIEW_CHARS).collect();
    if status == StatusCode::NOT_FOUND {
        ModelError::Unavailable(format!("HTTP {}: {}", status, preview))
    } else {
        ModelError::Other(format!("HTTP {}: {}", status, preview))
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, ModelError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModelError::Other("Model returned an empty response".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> ModelConfig {
        ModelConfig {
            api_key: api_key.map(str::to_string),
            endpoint: "http://127.0.0.1:9/".to_string(),
            models: vec!["gemini-1.5-flash".to_string()],
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_url_for_model() {
        let client = GeminiClient::new(&config(Some("key"))).unwrap();
        assert_eq!(
            client.url_for("gemini-1.5-flash"),
            "http://127.0.0.1:9/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "model not found"),
            ModelError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ModelError::Other(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "quota"),
            ModelError::Other(_)
        ));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{\"summary\":"}, {"text": " \"ok\"}"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn test_extract_text_empty_response() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(extract_text(response), Err(ModelError::Other(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let client = GeminiClient::new(&config(None)).unwrap();
        let result = client.generate("system", "prompt").await;
        assert!(matches!(result, Err(ModelError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_blank_api_key_is_unavailable() {
        let client = GeminiClient::new(&config(Some("  "))).unwrap();
        let result = client.generate("system", "prompt").await;
        assert!(matches!(result, Err(ModelError::Unavailable(_))));
    }
}
