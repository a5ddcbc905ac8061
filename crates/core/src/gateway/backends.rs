//! # Model Backends
//!
//! A backend turns `(system instruction, user prompt, config)` into raw text.
//! Structured extraction happens in the gateway, never here.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::BackendError;
use crate::models::GenerationConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest error body kept in a `BackendError::Status`
const ERROR_BODY_LIMIT: usize = 300;

/// One logical generate request
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub system_instruction: &'a str,
    pub user_prompt: &'a str,
    /// Ask the backend for its extended reasoning mode
    pub include_thoughts: bool,
}

/// Opaque request/response pair for one model target
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Identifier used in attempt logs
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendError>;
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body: body.chars().take(ERROR_BODY_LIMIT).collect(),
    })
}

/// Google Gemini `generateContent` backend
pub struct GeminiBackend {
    client: reqwest::Client,
    name: String,
    model: String,
    api_key: String,
    base_url: String,
    generation: GenerationConfig,
}

impl GeminiBackend {
    pub fn new(model: &str, api_key: String, generation: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: format!("gemini:{model}"),
            model: model.to_string(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            generation,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
    /// Thought summaries are reported as separate parts
    #[serde(default)]
    thought: bool,
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendError> {
        let mut generation_config = json!({
            "temperature": self.generation.temperature,
            "topP": self.generation.top_p,
            "topK": self.generation.top_k,
            "maxOutputTokens": self.generation.max_output_tokens,
        });
        if request.include_thoughts {
            generation_config["thinkingConfig"] = json!({ "includeThoughts": true });
        }

        let body = json!({
            "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": request.user_prompt }] }],
            "generationConfig": generation_config,
        });

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let parsed: GeminiResponse = error_for_status(response).await?.json().await?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(text)
    }
}

/// OpenAI chat-completions backend, also used for compatible endpoints
pub struct OpenAiBackend {
    client: reqwest::Client,
    name: String,
    model: String,
    api_key: String,
    base_url: String,
    generation: GenerationConfig,
}

impl OpenAiBackend {
    pub fn new(model: &str, api_key: String, generation: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: format!("openai:{model}"),
            model: model.to_string(),
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            generation,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendError> {
        // Chat completions has no portable thinking switch; the flag is ignored.
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.user_prompt },
            ],
            "temperature": self.generation.temperature,
            "top_p": self.generation.top_p,
            "max_tokens": self.generation.max_output_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let parsed: ChatResponse = error_for_status(response).await?.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(BackendError::EmptyResponse)
    }
}
