//! Client for the Google Generative Language `generateContent` endpoint.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

use crate::config::Config;
use crate::insights::{InsightsError, InsightsProvider};

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub(crate) struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) timeout: Duration,
}

impl GeminiConfig {
    /// Build from the config file and environment.
    ///
    /// Environment variables:
    /// - `GEMINI_API_KEY` (wins over `[insights] api_key`)
    /// - `GEMINI_BASE_URL` (optional)
    pub(crate) fn from_config(config: &Config) -> Result<Self, InsightsError> {
        let api_key = config.gemini_api_key().ok_or(InsightsError::MissingApiKey)?;
        build_headers(&api_key)?;
        let base_url = resolve_base_url(&config.insights.base_url)
            .map_err(|e| InsightsError::Transport(e.to_string()))?;

        Ok(Self {
            api_key,
            base_url,
            model: config.insights.model.clone(),
            timeout: Duration::from_secs(config.insights.timeout_secs),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }
}

/// Gemini client.
pub(crate) struct GeminiClient {
    config: GeminiConfig,
    http: Client,
}

impl GeminiClient {
    pub(crate) fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Unable to build HTTP client")?;
        Ok(Self { config, http })
    }
}

impl InsightsProvider for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, InsightsError> {
        let response = self.http
            .post(self.config.endpoint())
            .headers(build_headers(&self.config.api_key)?)
            .json(&build_request(prompt))
            .send()
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().unwrap_or_default();
            return Err(InsightsError::Http(status.as_u16(), error_body));
        }

        let body: Value = response.json().map_err(classify_reqwest_error)?;
        extract_text(&body).ok_or(InsightsError::NoContent)
    }
}

fn resolve_base_url(config_base_url: &str) -> anyhow::Result<String> {
    if let Ok(env_url) = std::env::var("GEMINI_BASE_URL") {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    let trimmed = config_base_url.trim();
    validate_url(trimmed)?;
    Ok(trimmed.to_string())
}

fn validate_url(url: &str) -> anyhow::Result<()> {
    reqwest::Url::parse(url).with_context(|| format!("Invalid Gemini base URL: {}", url))?;
    Ok(())
}

fn build_headers(api_key: &str) -> Result<HeaderMap, InsightsError> {
    let mut headers = HeaderMap::new();
    let key = HeaderValue::from_str(api_key).map_err(|_| InsightsError::InvalidApiKey)?;
    headers.insert("x-goog-api-key", key);
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn classify_reqwest_error(e: reqwest::Error) -> InsightsError {
    if e.is_timeout() {
        InsightsError::Transport(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        InsightsError::Transport(format!("Connection failed: {}", e))
    } else if e.is_decode() {
        InsightsError::NoContent
    } else {
        InsightsError::Transport(format!("Network error: {}", e))
    }
}

fn build_request(prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": prompt }]
        }]
    })
}

/// `candidates[0].content.parts[0].text`
fn extract_text(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}
