use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use scopecast_core::config::Config;
use scopecast_core::ingest::{ingest, Ingested};
use scopecast_core::request::AnalyzeRequest;
use scopecast_core::roles::Roster;
use scopecast_core::types::EstimateDocument;
use scopecast_core::EstimateError;

use crate::prompt::{system_instruction, user_instruction};
use crate::schema::estimate_schema;
use crate::{AiError, Result};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

/// A parsed document plus the usage that produced it.
#[derive(Debug)]
pub struct Generated {
    pub document: EstimateDocument,
    pub usage: Usage,
}

// ---------------------------------------------------------------------------
// EstimatorClient
// ---------------------------------------------------------------------------

/// Client for the `generateContent` endpoint of the configured model.
#[derive(Debug, Clone)]
pub struct EstimatorClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    temperature: f32,
}

impl EstimatorClient {
    /// Build a client from config. The API key is read from the configured
    /// environment variable now; a missing key only fails at request time.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ai = &config.ai;
        let http = Client::builder()
            .timeout(Duration::from_secs(ai.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            endpoint: ai.endpoint.trim_end_matches('/').to_string(),
            model: ai.model.clone(),
            api_key: ai.api_key(),
            api_key_env: ai.api_key_env.clone(),
            temperature: ai.temperature,
        })
    }

    /// Override the key read from the environment.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    /// Ask the service for an estimate and parse its JSON answer.
    pub async fn generate(&self, request: &AnalyzeRequest, roster: &Roster) -> Result<Generated> {
        let api_key = self.api_key.as_ref().ok_or_else(|| AiError::NoApiKey {
            env: self.api_key_env.clone(),
        })?;

        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system_instruction(roster),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: user_instruction(request),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: estimate_schema(),
                temperature: self.temperature,
            },
        };

        info!(model = %self.model, project = %request.project_name, "requesting estimate");

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("estimate request timed out");
                } else if e.is_connect() {
                    error!("failed to connect to generation service: {e}");
                }
                AiError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(status = status.as_u16(), "generation service error: {body}");
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(format!("unexpected response envelope: {e}")))?;

        let usage = parsed.usage_metadata.unwrap_or_default();
        let candidate = parsed.candidates.into_iter().next();
        let finish_reason = candidate
            .as_ref()
            .and_then(|c| c.finish_reason.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let text: String = candidate
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::Empty { finish_reason });
        }

        let document = parse_document(&text)?;
        info!(
            phases = document.phases.len(),
            total_tokens = usage.total_token_count,
            "estimate received"
        );
        Ok(Generated { document, usage })
    }

    /// Generate, then validate and canonicalize against the configured
    /// roster.
    pub async fn estimate(&self, request: &AnalyzeRequest, config: &Config) -> Result<Ingested> {
        let generated = self.generate(request, &config.roles).await?;
        Ok(ingest(
            generated.document,
            &config.roles,
            config.estimate.unmatched_roles,
        )?)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Strip a surrounding markdown code fence (```json ... ```), if any.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let start = trimmed.find('\n').map(|i| i + 1).unwrap_or(trimmed.len());
    let end = trimmed[start..]
        .rfind("```")
        .map(|i| i + start)
        .unwrap_or(trimmed.len());
    trimmed[start..end].trim()
}

pub fn parse_document(text: &str) -> Result<EstimateDocument> {
    let json = extract_json(text);
    EstimateDocument::from_json(json).map_err(|e| match e {
        EstimateError::Malformed(msg) => {
            error!(
                "estimate JSON did not parse: {msg}. snippet: {}",
                json.chars().take(300).collect::<String>()
            );
            AiError::Parse(msg)
        }
        other => AiError::Rejected(other),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use scopecast_core::ingest::UnmatchedRolePolicy;
    use scopecast_core::types::fixtures::sample_document;
    use scopecast_core::types::RoleRate;

    const PATH: &str = "/v1beta/models/gemini-test:generateContent";

    fn config(endpoint: &str) -> Config {
        let mut cfg = Config::default();
        cfg.ai.endpoint = endpoint.to_string();
        cfg.ai.model = "gemini-test".to_string();
        cfg.ai.api_key_env = "SCOPECAST_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        cfg.ai.timeout_secs = 5;
        cfg
    }

    fn client(endpoint: &str) -> EstimatorClient {
        EstimatorClient::from_config(&config(endpoint))
            .unwrap()
            .with_api_key(Some("test-key".to_string()))
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            project_name: "Clinic Booking".into(),
            project_type: None,
            description: "Patients book, reschedule and cancel dental appointments online."
                .into(),
            currency: "USD".into(),
            role_rates: vec![RoleRate {
                role: "Back-end Developer".into(),
                hourly_rate: 55.0,
            }],
        }
    }

    fn envelope(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 900,
                "candidatesTokenCount": 1200,
                "totalTokenCount": 2100
            }
        })
        .to_string()
    }

    #[test]
    fn extract_json_strips_fences() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(extract_json("```\n{}\n```\n"), "{}");
    }

    #[test]
    fn parse_document_reports_malformed_text() {
        let err = parse_document("I cannot estimate this.").unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = EstimatorClient::from_config(&config("http://127.0.0.1:9")).unwrap();
        assert!(!client.has_api_key());
        let err = client
            .generate(&request(), &Roster::default())
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err
            .to_string()
            .contains("SCOPECAST_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[tokio::test]
    async fn generate_parses_document() {
        let mut server = mockito::Server::new_async().await;
        let doc = sample_document();
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(envelope(&serde_json::to_string(&doc).unwrap()))
            .create_async()
            .await;

        let generated = client(&server.url())
            .generate(&request(), &Roster::default())
            .await
            .unwrap();
        assert_eq!(generated.document, doc);
        assert_eq!(generated.usage.total_token_count, 2100);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fenced_answer_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        let fenced = format!(
            "```json\n{}\n```",
            serde_json::to_string(&sample_document()).unwrap()
        );
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(envelope(&fenced))
            .create_async()
            .await;

        let generated = client(&server.url())
            .generate(&request(), &Roster::default())
            .await
            .unwrap();
        assert_eq!(generated.document.project_name, "Clinic Booking");
    }

    #[tokio::test]
    async fn http_error_status_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = client(&server.url())
            .generate(&request(), &Roster::default())
            .await
            .unwrap_err();
        match err {
            AiError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_conforming_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(envelope(r#"{"projectName":"half an estimate"}"#))
            .create_async()
            .await;

        let err = client(&server.url())
            .generate(&request(), &Roster::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }

    #[tokio::test]
    async fn empty_candidates_is_empty_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .generate(&request(), &Roster::default())
            .await
            .unwrap_err();
        match err {
            AiError::Empty { finish_reason } => assert_eq!(finish_reason, "SAFETY"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn estimate_ingests_against_roster() {
        let mut server = mockito::Server::new_async().await;
        let mut doc = sample_document();
        doc.phases[0].tasks[0].role = "Astronaut".into();
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(envelope(&serde_json::to_string(&doc).unwrap()))
            .create_async()
            .await;

        let mut cfg = config(&server.url());
        let client = EstimatorClient::from_config(&cfg)
            .unwrap()
            .with_api_key(Some("test-key".into()));

        let ingested = client.estimate(&request(), &cfg).await.unwrap();
        assert_eq!(ingested.quarantined.len(), 1);
        assert_eq!(ingested.document.phases[1].tasks[1].role, "Back-end Developer");

        cfg.estimate.unmatched_roles = UnmatchedRolePolicy::Reject;
        let err = client.estimate(&request(), &cfg).await.unwrap_err();
        assert!(matches!(
            err,
            AiError::Rejected(EstimateError::UnknownRole { .. })
        ));
    }
}
