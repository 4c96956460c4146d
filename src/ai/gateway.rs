use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ai::normalize;
use crate::config::LlmConfig;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    raw: String,
    #[serde(default)]
    parsed: Option<Value>,
}

/// What came back from one model call. Failures are values, not errors: the
/// classifier downgrades to its rule-based verdict and records [`status`].
///
/// [`status`]: LlmOutcome::status
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutcome {
    Parsed(Map<String, Value>),
    Disabled,
    UrlMissing,
    Unreachable(String),
    NoParseableOutput,
}

impl LlmOutcome {
    pub fn status(&self) -> String {
        match self {
            LlmOutcome::Parsed(_) => "ok".to_string(),
            LlmOutcome::Disabled => "llm_disabled".to_string(),
            LlmOutcome::UrlMissing => "llm_url_missing".to_string(),
            LlmOutcome::Unreachable(cause) => format!("llm_unreachable:{cause}"),
            LlmOutcome::NoParseableOutput => "llm_no_parseable_output".to_string(),
        }
    }
}

pub trait LlmGateway {
    async fn classify(&self, prompt: &str) -> LlmOutcome;
}

/// Short machine-readable cause for a failed gateway request.
fn unreachable_cause(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else if let Some(status) = err.status() {
        format!("http_{}", status.as_u16())
    } else if err.is_connect() {
        "connect".to_string()
    } else if err.is_decode() {
        "decode".to_string()
    } else {
        "request".to_string()
    }
}

/// Interprets a gateway response body. `parsed` wins when it is an object;
/// otherwise the raw model text gets one more pass through the normalizer.
fn outcome_from_response(response: ClassifyResponse) -> LlmOutcome {
    if let Some(Value::Object(map)) = response.parsed {
        return LlmOutcome::Parsed(map);
    }
    match normalize(&response.raw) {
        Some(map) => LlmOutcome::Parsed(map),
        None => {
            tracing::debug!(raw_len = response.raw.len(), "LLM answered without parseable JSON");
            LlmOutcome::NoParseableOutput
        }
    }
}

/// Talks to the gateway service over HTTP: `POST {gateway_url}/classify`.
pub struct HttpLlmGateway {
    client: Client,
    enabled: bool,
    gateway_url: Option<String>,
}

impl HttpLlmGateway {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            enabled: config.enabled,
            gateway_url: config
                .gateway_url
                .as_ref()
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        })
    }
}

impl LlmGateway for HttpLlmGateway {
    async fn classify(&self, prompt: &str) -> LlmOutcome {
        if !self.enabled {
            return LlmOutcome::Disabled;
        }
        let Some(base) = &self.gateway_url else {
            return LlmOutcome::UrlMissing;
        };

        let endpoint = format!("{base}/classify");
        let response = match self
            .client
            .post(&endpoint)
            .json(&ClassifyRequest { text: prompt })
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%endpoint, error = %e, "LLM gateway request failed");
                return LlmOutcome::Unreachable(unreachable_cause(&e));
            }
        };

        match response.json::<ClassifyResponse>().await {
            Ok(body) => outcome_from_response(body),
            Err(e) => {
                tracing::warn!(%endpoint, error = %e, "LLM gateway sent an unreadable body");
                LlmOutcome::Unreachable(unreachable_cause(&e))
            }
        }
    }
}
