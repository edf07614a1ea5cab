// src/ai_handler.rs
//
// Client for the table autofill service. Not reachable from the UI yet; the
// handler exists so the wiring is a one-line change once a button lands.
// Without GEMINI_API_KEY in the environment every call fails fast with
// `AiError::MissingApiKey` before any request is made.

use serde::{Deserialize, Serialize};

use crate::error::AiError;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-2.5-flash";
const SYSTEM_INSTRUCTION: &str =
    "You are a data assistant. Return only JSON array of arrays representing a table.";

pub struct AiHandler {
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl AiHandler {
    /// Reads the credential from the `GEMINI_API_KEY` environment variable.
    pub fn new() -> Self {
        let key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        AiHandler::with_endpoint(key, DEFAULT_ENDPOINT)
    }

    /// Explicit credential and endpoint, used by tests to point the client at
    /// a local server.
    pub fn with_endpoint(api_key: Option<String>, endpoint: impl Into<String>) -> Self {
        AiHandler {
            api_key,
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Asks the model to produce table rows for the given prompt. The reply
    /// is expected to be a JSON array of arrays; scalar cells are coerced to
    /// their text form.
    pub async fn generate_table_rows(&self, prompt: &str) -> Result<Vec<Vec<String>>, AiError> {
        let Some(key) = &self.api_key else {
            return Err(AiError::MissingApiKey);
        };

        let request = GenerateRequest {
            system_instruction: ContentPayload {
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: vec![ContentPayload {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let url = format!("{}/models/{MODEL}:generateContent", self.endpoint);
        log::debug!("requesting table rows from {MODEL}");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| AiError::Parse("response contained no candidates".to_string()))?;
        parse_rows(text)
    }
}

impl Default for AiHandler {
    fn default() -> Self {
        AiHandler::new()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    system_instruction: ContentPayload<'a>,
    contents: Vec<ContentPayload<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct ContentPayload<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

/// Parses the model reply into rows, tolerating a markdown code fence around
/// the JSON.
fn parse_rows(text: &str) -> Result<Vec<Vec<String>>, AiError> {
    let payload = strip_fences(text);
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| AiError::Parse(e.to_string()))?;
    let rows = value
        .as_array()
        .ok_or_else(|| AiError::Parse("expected a JSON array of rows".to_string()))?;
    rows.iter()
        .map(|row| {
            let cells = row
                .as_array()
                .ok_or_else(|| AiError::Parse("expected each row to be an array".to_string()))?;
            Ok(cells.iter().map(cell_text).collect())
        })
        .collect()
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn parses_an_array_of_arrays() {
        let rows = parse_rows(r#"[["Apples","12"],["Pears","7"]]"#).expect("valid payload");
        assert_eq!(
            rows,
            vec![
                vec!["Apples".to_string(), "12".to_string()],
                vec!["Pears".to_string(), "7".to_string()],
            ]
        );
    }

    #[test]
    fn coerces_scalar_cells_to_text() {
        let rows = parse_rows(r#"[[1, true, null]]"#).expect("valid payload");
        assert_eq!(
            rows,
            vec![vec!["1".to_string(), "true".to_string(), String::new()]]
        );
    }

    #[test]
    fn tolerates_a_markdown_fence() {
        let rows = parse_rows("```json\n[[\"a\"]]\n```").expect("fenced payload");
        assert_eq!(rows, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(matches!(
            parse_rows(r#"{"rows": []}"#),
            Err(AiError::Parse(_))
        ));
        assert!(matches!(parse_rows(r#"["flat"]"#), Err(AiError::Parse(_))));
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let handler = AiHandler::with_endpoint(None, "http://127.0.0.1:9");
        let err = handler.generate_table_rows("three fruits").await;
        assert!(matches!(err, Err(AiError::MissingApiKey)));
    }

    #[tokio::test]
    async fn sends_the_credential_and_parses_the_reply() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-2.5-flash:generateContent")
                    .header("x-goog-api-key", "test-key");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {
                            "parts": [{ "text": "[[\"Apples\",\"12\"]]" }]
                        }
                    }]
                }));
            })
            .await;

        let handler = AiHandler::with_endpoint(Some("test-key".to_string()), server.base_url());
        let rows = handler
            .generate_table_rows("fruit stock")
            .await
            .expect("mocked request should succeed");

        mock.assert_async().await;
        assert_eq!(rows, vec![vec!["Apples".to_string(), "12".to_string()]]);
    }

    #[tokio::test]
    async fn error_statuses_surface_as_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-2.5-flash:generateContent");
                then.status(429).body("quota exhausted");
            })
            .await;

        let handler = AiHandler::with_endpoint(Some("test-key".to_string()), server.base_url());
        let err = handler.generate_table_rows("anything").await;
        match err {
            Err(AiError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert!(message.contains("quota"));
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidate_list_is_a_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-2.5-flash:generateContent");
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let handler = AiHandler::with_endpoint(Some("test-key".to_string()), server.base_url());
        let err = handler.generate_table_rows("anything").await;
        assert!(matches!(err, Err(AiError::Parse(_))));
    }
}
