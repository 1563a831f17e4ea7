//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete backends:
//! - **[`LocalProvider`]** — runs a sentence-embedding model locally via
//!   fastembed (default; no network after model download).
//! - **[`OllamaProvider`]** — calls a local Ollama instance's `/api/embed`
//!   endpoint.
//! - **[`OpenAIProvider`]** — calls the OpenAI embeddings API.
//!
//! Every provider is deterministic for a given (model, text) pair and
//! always returns vectors of its fixed dimensionality. Construction
//! failures are fatal at startup ([`Error::Initialization`]); the process
//! cannot match anything without a working provider.
//!
//! # Retry strategy
//!
//! The HTTP providers retry transient failures with exponential backoff
//! (1s, 2s, 4s, ... capped at 32s): HTTP 429 and 5xx retry, other 4xx
//! fail immediately, network errors retry. The index and matcher layers
//! above never add retries of their own.

#[cfg(feature = "local-embeddings")]
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// A text-to-vector encoder with a fixed output dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Encode a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Encode a single query text.
///
/// Convenience wrapper around [`EmbeddingProvider::embed`] for
/// single-text use cases (e.g. embedding a search query).
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let results = provider.embed(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("empty embedding response".to_string()))
}

/// Create the provider named by the configuration.
///
/// Fails with [`Error::Initialization`] for unknown provider names or
/// when the named provider cannot be constructed (missing model, missing
/// API key, missing feature flag). Callers should treat this as fatal.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Box::new(LocalProvider::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => Err(Error::Initialization(
            "local embedding provider requires --features local-embeddings".to_string(),
        )),
        "ollama" => Ok(Box::new(OllamaProvider::new(config)?)),
        "openai" => Ok(Box::new(OpenAIProvider::new(config)?)),
        other => Err(Error::Initialization(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

// ============ Local Provider (fastembed) ============

/// Embedding provider for local inference via fastembed.
///
/// The model is downloaded on first use from Hugging Face and cached;
/// after that, embeddings run entirely offline. The ONNX session is
/// created once at startup so model-load failures surface as
/// initialization errors rather than mid-request surprises.
#[cfg(feature = "local-embeddings")]
pub struct LocalProvider {
    model_name: String,
    dims: usize,
    batch_size: usize,
    model: Arc<std::sync::Mutex<fastembed::TextEmbedding>>,
}

#[cfg(feature = "local-embeddings")]
impl LocalProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| "all-minilm-l6-v2".to_string());
        let fastembed_model = fastembed_model(&model_name)?;
        let dims = config.dims.unwrap_or(match model_name.as_str() {
            "all-minilm-l6-v2" | "bge-small-en-v1.5" => 384,
            "bge-base-en-v1.5" | "nomic-embed-text-v1.5" => 768,
            "bge-large-en-v1.5" => 1024,
            _ => 384,
        });

        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed_model).with_show_download_progress(false),
        )
        .map_err(|e| {
            Error::Initialization(format!("failed to load local embedding model: {}", e))
        })?;

        Ok(Self {
            model_name,
            dims,
            batch_size: config.batch_size,
            model: Arc::new(std::sync::Mutex::new(model)),
        })
    }
}

#[cfg(feature = "local-embeddings")]
fn fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
        other => Err(Error::Initialization(format!(
            "unknown local embedding model: '{}'. Supported: all-minilm-l6-v2, \
             bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, nomic-embed-text-v1.5",
            other
        ))),
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl EmbeddingProvider for LocalProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let batch_size = self.batch_size;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, Some(batch_size))
                .map_err(|e| Error::Embedding(format!("local embedding failed: {}", e)))
        })
        .await
        .map_err(|e| Error::Embedding(format!("embedding task panicked: {}", e)))?
    }
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Calls `POST /api/embed` on the configured URL (default
/// `http://localhost:11434`). Requires Ollama to be running with an
/// embedding model pulled (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaProvider {
    model: String,
    dims: usize,
    url: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config.model.clone().ok_or_else(|| {
            Error::Initialization("embedding.model required for Ollama provider".to_string())
        })?;
        let dims = config.dims.ok_or_else(|| {
            Error::Initialization("embedding.dims required for Ollama provider".to_string())
        })?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(Self {
            model,
            dims,
            url,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = post_with_retry(
            &format!("{}/api/embed", self.url),
            None,
            &body,
            self.max_retries,
            self.timeout_secs,
        )
        .await?;

        let embeddings = json
            .get("embeddings")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                Error::Embedding("invalid Ollama response: missing embeddings array".to_string())
            })?;

        embeddings.iter().map(parse_float_array).collect()
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Calls `POST /v1/embeddings` with the configured model. Requires the
/// `OPENAI_API_KEY` environment variable.
pub struct OpenAIProvider {
    model: String,
    dims: usize,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAIProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config.model.clone().ok_or_else(|| {
            Error::Initialization("embedding.model required for OpenAI provider".to_string())
        })?;
        let dims = config.dims.ok_or_else(|| {
            Error::Initialization("embedding.dims required for OpenAI provider".to_string())
        })?;
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            Error::Initialization("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        Ok(Self {
            model,
            dims,
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = post_with_retry(
            "https://api.openai.com/v1/embeddings",
            Some(&self.api_key),
            &body,
            self.max_retries,
            self.timeout_secs,
        )
        .await?;

        let data = json.get("data").and_then(|d| d.as_array()).ok_or_else(|| {
            Error::Embedding("invalid OpenAI response: missing data array".to_string())
        })?;

        data.iter()
            .map(|item| {
                let embedding = item.get("embedding").ok_or_else(|| {
                    Error::Embedding("invalid OpenAI response: missing embedding".to_string())
                })?;
                parse_float_array(embedding)
            })
            .collect()
    }
}

// ============ Shared HTTP plumbing ============

fn parse_float_array(value: &Value) -> Result<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| Error::Embedding("embedding is not an array".to_string()))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| Error::Embedding("embedding contains a non-number".to_string()))
        })
        .collect()
}

/// POST a JSON body and return the parsed response, retrying 429/5xx and
/// network errors with exponential backoff.
async fn post_with_retry(
    url: &str,
    bearer: Option<&str>,
    body: &Value,
    max_retries: u32,
    timeout_secs: u64,
) -> Result<Value> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Embedding(format!("failed to build HTTP client: {}", e)))?;

    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response
                        .json::<Value>()
                        .await
                        .map_err(|e| Error::Embedding(format!("invalid JSON response: {}", e)));
                }

                let body_text = response.text().await.unwrap_or_default();
                // Rate limited or server error: retry. Other client
                // errors fail immediately.
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(Error::Embedding(format!(
                        "{} returned {}: {}",
                        url, status, body_text
                    )));
                    continue;
                }
                return Err(Error::Embedding(format!(
                    "{} returned {}: {}",
                    url, status, body_text
                )));
            }
            Err(e) => {
                last_err = Some(Error::Embedding(format!("request to {} failed: {}", url, e)));
                continue;
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| Error::Embedding(format!("embedding via {} failed after retries", url))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;

    #[test]
    fn test_unknown_provider_is_initialization_error() {
        let config = EmbeddingConfig {
            provider: "sentence-transformers".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(Error::Initialization(_))
        ));
    }

    #[test]
    fn test_ollama_requires_model_and_dims() {
        let config = EmbeddingConfig {
            provider: "ollama".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            OllamaProvider::new(&config),
            Err(Error::Initialization(_))
        ));
    }

    #[test]
    fn test_parse_float_array() {
        let value = serde_json::json!([0.25, -1.5, 3.0]);
        assert_eq!(parse_float_array(&value).unwrap(), vec![0.25, -1.5, 3.0]);

        let bad = serde_json::json!([0.25, "nope"]);
        assert!(matches!(parse_float_array(&bad), Err(Error::Embedding(_))));
    }
}
