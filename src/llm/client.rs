//! Gemini text-generation client.
//!
//! Sends the listening description with a fixed instruction asking for the
//! three labelled sections and returns the raw generated text. Turning that
//! text into sections is the job of [`crate::analysis::extract_sections`].

use crate::config::ModelConfig;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the generation client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub model_name: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
    /// Show a spinner while waiting for the response.
    pub show_progress: bool,
}

impl ClientConfig {
    pub fn from_model_config(model: &ModelConfig, api_key: String, show_progress: bool) -> Self {
        Self {
            endpoint: model.endpoint.trim_end_matches('/').to_string(),
            model_name: model.name.clone(),
            api_key,
            temperature: model.temperature,
            max_output_tokens: model.max_output_tokens,
            timeout_seconds: model.timeout_seconds,
            show_progress,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// `generateContent` response body.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                warn!("Generation finished early: {}", reason);
            }
        }

        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Client for the Gemini `generateContent` API.
pub struct GeminiClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        info!("Initializing generation client with model {}", config.model_name);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.endpoint, self.config.model_name
        )
    }

    fn build_request(&self, description: &str) -> GenerateRequest {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: build_prompt(description),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    /// Generate the analysis text for a listening description.
    pub async fn generate(&self, description: &str) -> Result<String> {
        let request = self.build_request(description);
        debug!("Sending generation request ({} chars of input)", description.len());

        let spinner = if self.config.show_progress {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
                pb.set_style(style);
            }
            pb.set_message("Analyzing your musical personality...");
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let result = self.send(&request).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let text = result?;
        info!("Received {} chars of generated text", text.len());
        Ok(text)
    }

    async fn send(&self, request: &GenerateRequest) -> Result<String> {
        let response = self
            .http_client
            .post(self.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.config.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to Gemini at {}", self.config.endpoint)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API error {}: {}", status, body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        body.into_text()
            .context("Gemini returned no text (the response may have been blocked)")
    }
}

/// User prompt for one analysis.
pub fn build_prompt(description: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("Here is what someone listens to:\n\n");
    prompt.push_str(description.trim());
    prompt.push_str("\n\nWrite their music personality analysis in exactly three sections, ");
    prompt.push_str("each starting with its label on its own line:\n\n");
    prompt.push_str("MIRROR: 2-3 sentences reflecting their taste back to them.\n");
    prompt.push_str("HIDDEN PATTERN: a named archetype and the psychological insight behind it.\n");
    prompt.push_str("ACTIONABLE STEPS: one line each for a journal prompt, a listening challenge, ");
    prompt.push_str("and three serendipity picks.\n");
    prompt
}

const SYSTEM_PROMPT: &str = r#"You are a music psychologist. You read listening habits the way a
therapist reads a journal: warmly, specifically, and without flattery.
Ground every observation in the artists and tracks you are given.
Use the section labels exactly as requested and no other headings."#;
