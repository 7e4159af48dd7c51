// MacBERT-CSC Corrector
// Calls a pycorrector-style inference service hosting shibing624/macbert4csc-base-chinese

use crate::error::{EvalError, Result as EvalResult};
use crate::models::{CorrectionResult, ErrorDetail};
use crate::services::config_store::{AppConfig, ModelConfig, MACBERT_CSC_KEY};
use crate::services::corrector::{Corrector, CorrectorError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
struct CorrectRequest<'a> {
    model: &'a str,
    text: &'a str,
}

/// The service answers either with pycorrector's record form
/// `{"source": ..., "target": ..., "errors": [[wrong, right, pos], ...]}`
/// or with the older `[target, [[wrong, right, pos], ...]]` pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CorrectResponse {
    Record {
        #[serde(default)]
        #[allow(dead_code)]
        source: Option<String>,
        target: String,
        #[serde(default)]
        errors: Vec<Value>,
    },
    Pair(String, Vec<Value>),
}

impl CorrectResponse {
    fn into_parts(self) -> (String, Vec<Value>) {
        match self {
            Self::Record { target, errors, .. } => (target, errors),
            Self::Pair(target, errors) => (target, errors),
        }
    }
}

fn fragment(v: &Value) -> String {
    match v.as_str() {
        Some(s) => s.to_string(),
        None => v.to_string(),
    }
}

/// Normalize raw error tuples.
///
/// `[wrong, right, pos]` keeps the position; `[wrong, right]` (older library
/// versions) has no position. Anything else is skipped.
pub fn parse_errors(details: &[Value]) -> Vec<ErrorDetail> {
    details
        .iter()
        .filter_map(|d| {
            let items = d.as_array()?;
            match items.len() {
                0 | 1 => None,
                2 => Some(ErrorDetail {
                    position: None,
                    original: fragment(&items[0]),
                    corrected: fragment(&items[1]),
                }),
                _ => Some(ErrorDetail {
                    position: items[2].as_u64().map(|p| p as usize),
                    original: fragment(&items[0]),
                    corrected: fragment(&items[1]),
                }),
            }
        })
        .collect()
}

pub struct MacBertCscCorrector {
    name: String,
    model_id: String,
    base_url: String,
    timeout: Duration,
    proxy_url: Option<String>,
    client: OnceCell<Client>,
}

impl MacBertCscCorrector {
    pub fn new(model: &ModelConfig, proxy_url: Option<&str>) -> Self {
        Self {
            name: model.name.clone(),
            model_id: model.model_id.clone(),
            base_url: model.resolved_url(),
            timeout: Duration::from_secs(model.timeout_secs.max(1)),
            proxy_url: proxy_url.map(str::to_string),
            client: OnceCell::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn correct_url(&self) -> String {
        format!("{}/correct", self.base_url.trim_end_matches('/'))
    }

    fn build_client(&self) -> Result<Client, CorrectorError> {
        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(proxy_url) = &self.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        builder.build().map_err(|e| CorrectorError::LoadFailed {
            model: self.name.clone(),
            reason: e.to_string(),
        })
    }

    async fn client(&self) -> Result<&Client, CorrectorError> {
        self.client
            .get_or_try_init(|| async {
                let client = self.build_client()?;
                info!(model = %self.name, url = %self.base_url, "corrector.loaded");
                Ok::<Client, CorrectorError>(client)
            })
            .await
    }
}

impl Corrector for MacBertCscCorrector {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn load(&mut self) -> Result<(), CorrectorError> {
        self.client().await.map(|_| ())
    }

    fn is_loaded(&self) -> bool {
        self.client.initialized()
    }

    async fn correct(&self, sentence: &str) -> Result<CorrectionResult, CorrectorError> {
        let client = self.client().await?;
        let request = CorrectRequest {
            model: &self.model_id,
            text: sentence,
        };

        let start = Instant::now();

        let response = client
            .post(self.correct_url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CorrectorError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: CorrectResponse = response
            .json()
            .await
            .map_err(|e| CorrectorError::MalformedResponse(e.to_string()))?;

        let (target, raw_errors) = data.into_parts();
        let errors = parse_errors(&raw_errors);
        debug!(latency_ms, errors = errors.len(), "corrector.response");

        Ok(CorrectionResult::new(sentence, target, errors))
    }
}

/// Build the corrector registered under `key`. Only `macbert_csc` exists.
pub fn create_corrector(key: &str, config: &AppConfig) -> EvalResult<MacBertCscCorrector> {
    if key != MACBERT_CSC_KEY {
        return Err(EvalError::UnsupportedModel(key.to_string()));
    }
    let model = config
        .models
        .get(key)
        .ok_or_else(|| CorrectorError::NotConfigured(key.to_string()))?;
    let proxy = config.proxy.as_ref().and_then(|p| p.active_url());
    Ok(MacBertCscCorrector::new(model, proxy))
}
