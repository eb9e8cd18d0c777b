use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::errors::CourseRagError;

/// Decoding parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Greedy decoding (temperature 0) capped at `max_output_tokens`.
    pub fn deterministic(max_output_tokens: u32) -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens,
        }
    }
}

/// A text generation backend. The system instruction is fixed when the
/// implementation is constructed, not passed per call.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    system_instruction: String,
}

impl GeminiClient {
    pub fn new(
        settings: &Settings,
        system_instruction: impl Into<String>,
    ) -> Result<Self, CourseRagError> {
        if settings.api_key().trim().is_empty() {
            return Err(CourseRagError::MissingCredential);
        }
        let client = Client::builder()
            .timeout(settings.generation_timeout())
            .user_agent(concat!("course-rag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CourseRagError::ClientInit(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url().to_string(),
            model: settings.model().to_string(),
            api_key: settings.api_key().to_string(),
            system_instruction: system_instruction.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let payload = build_payload(prompt, &self.system_instruction, config);
        // Header auth keeps the key out of request URLs echoed in reqwest errors.
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Gemini request could not be sent")?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .context("failed to read Gemini response body")?;
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        if !status.is_success() {
            let detail = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or(raw.trim());
            return Err(anyhow!("Gemini returned {status}: {detail}"));
        }

        extract_text(&body)
    }
}

fn build_payload(prompt: &str, system_instruction: &str, config: &GenerationConfig) -> Value {
    serde_json::json!({
        "systemInstruction": {
            "parts": [{ "text": system_instruction }]
        },
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ],
        "generationConfig": {
            "temperature": config.temperature,
            "maxOutputTokens": config.max_output_tokens,
        }
    })
}

fn extract_text(body: &Value) -> Result<String> {
    if let Some(reason) = body
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(anyhow!("prompt was blocked by the provider ({reason})"));
    }

    let candidate = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| anyhow!("Gemini response contained no candidates"))?;

    let text = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let finish = candidate
            .get("finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("UNKNOWN");
        return Err(anyhow!("Gemini returned no text (finish reason {finish})"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_carries_generation_config() {
        let payload = build_payload("hi", "be brief", &GenerationConfig::deterministic(800));
        assert_eq!(payload["generationConfig"]["temperature"], 0.0);
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 800);
        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn extract_text_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello, " }, { "text": "world" }] },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(extract_text(&body).unwrap(), "Hello, world");
    }

    #[test]
    fn extract_text_reports_blocked_prompt() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_text(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn extract_text_reports_empty_candidate() {
        let body = json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] });
        let err = extract_text(&body).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
        assert!(extract_text(&json!({})).is_err());
    }

    #[test]
    fn endpoint_uses_configured_model() {
        let settings = Settings::from_lookup(|key| match key {
            "GEMINI_API_KEY" => Some("k".into()),
            "GEMINI_BASE_URL" => Some("http://localhost:9000/v1beta/".into()),
            _ => None,
        })
        .unwrap();
        let client = GeminiClient::new(&settings, "sys").unwrap();
        assert_eq!(client.model(), "gemini-2.0-flash");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(client.system_instruction(), "sys");
    }
}
