use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pacer::{RatePacer, DEFAULT_CALLS_PER_MINUTE};

pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
const API_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const DEFAULT_TEMPERATURE: f32 = 0.5;

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for the OpenAI-compatible chat-completions endpoint.
///
/// Every request first waits on the shared pacer, so all external calls made
/// through one client respect the process-wide rate budget. No retries are
/// made at this layer; callers decide whether a failure is soft or fatal.
pub struct GroqClient {
    client: Client,
    api_key: String,
    model: String,
    pacer: RatePacer,
}

impl GroqClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model,
            pacer: RatePacer::new(DEFAULT_CALLS_PER_MINUTE),
        })
    }

    /// Plain-text completion.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String> {
        self.send(system, prompt, max_tokens, false).await
    }

    /// JSON-mode completion. The raw content is re-parsed defensively: if a
    /// first parse fails, code-fence markers are stripped and parsing is
    /// attempted once more before giving up.
    pub async fn complete_json(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Value> {
        let content = self.send(system, prompt, max_tokens, true).await?;
        parse_json_payload(&content)
    }

    async fn send(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
        json_mode: bool,
    ) -> Result<String> {
        self.pacer.wait().await;

        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(Message {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(API_BASE_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to text-generation API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Text-generation API error: {} - {}", status, error_text);
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse text-generation API response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Text-generation API response missing message content")?;

        Ok(content.trim().to_string())
    }
}

fn parse_json_payload(content: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str(content) {
        return Ok(value);
    }

    serde_json::from_str(strip_code_fences(content))
        .with_context(|| format!("Failed to decode JSON from model output: {}", content))
}

/// Models sometimes wrap JSON-mode output in a ```json fence anyway.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
