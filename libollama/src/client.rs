//! Ollama correction client.
//!
//! Sends one word per request to `POST {host}/api/generate` with streaming
//! disabled and returns the cleaned-up `response` field. Uses the `reqwest`
//! blocking client; the engine runs it on its worker thread, so the event
//! loop never waits on the network.
//!
//! Repeated words within a session are answered from an LRU cache.

use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use libtypo_core::{CorrectionError, Corrector};

use crate::config::OllamaConfig;
use crate::prompt::{build_prompt, clean_response};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

type CacheKey = (String, Option<String>);

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

/// [`Corrector`] backed by an Ollama server.
pub struct OllamaCorrector {
    http: reqwest::blocking::Client,
    url: String,
    model: String,
    temperature: Option<f32>,
    cache: Option<LruCache<CacheKey, String>>,
    hits: u64,
    misses: u64,
}

impl OllamaCorrector {
    pub fn new(config: &OllamaConfig) -> Result<Self, CorrectionError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CorrectionError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            url: config.endpoint("/api/generate"),
            model: config.model.clone(),
            temperature: config.temperature,
            cache: NonZeroUsize::new(config.cache_size).map(LruCache::new),
            hits: 0,
            misses: 0,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.cache.as_ref().map_or(0, LruCache::len),
        }
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    fn request(&self, word: &str, context: Option<&str>) -> GenerateRequest<'_> {
        GenerateRequest {
            model: &self.model,
            prompt: build_prompt(word, context),
            stream: false,
            options: self.temperature.map(|temperature| GenerateOptions { temperature }),
        }
    }

    fn query(&self, word: &str, context: Option<&str>) -> Result<String, CorrectionError> {
        let body = self.request(word, context);
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CorrectionError::Service(format!("status {status}")));
        }
        let text = response.text().map_err(map_transport_error)?;
        parse_generate_response(&text)
    }
}

impl Corrector for OllamaCorrector {
    fn correct(&mut self, word: &str, context: Option<&str>) -> Result<String, CorrectionError> {
        let key: CacheKey = (word.to_string(), context.map(str::to_string));
        if let Some(hit) = self.cache.as_mut().and_then(|c| c.get(&key)).cloned() {
            self.hits += 1;
            debug!(word, corrected = %hit, "ollama: cache hit");
            return Ok(hit);
        }
        self.misses += 1;

        let corrected = self.query(word, context).inspect_err(|err| {
            warn!(word, error = %err, "ollama: correction request failed");
        })?;
        debug!(word, corrected = %corrected, model = %self.model, "ollama: corrected");

        if let Some(cache) = self.cache.as_mut() {
            cache.put(key, corrected.clone());
        }
        Ok(corrected)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Extract and clean the `response` field of a non-streaming generate reply.
pub fn parse_generate_response(body: &str) -> Result<String, CorrectionError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| CorrectionError::Service(format!("malformed response: {e}")))?;
    let corrected = clean_response(&parsed.response);
    if corrected.is_empty() {
        return Err(CorrectionError::Service("empty response".into()));
    }
    Ok(corrected)
}

fn map_transport_error(err: reqwest::Error) -> CorrectionError {
    if err.is_timeout() {
        CorrectionError::Timeout
    } else if err.is_connect() {
        CorrectionError::Unavailable(err.to_string())
    } else {
        CorrectionError::Service(err.to_string())
    }
}
