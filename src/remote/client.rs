use std::path::Path;

use anyhow::Context as _;
use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

use crate::{
    foundation::error::{ReskinError, ReskinResult},
    remote::job::{JobHandle, JobStatus},
};

/// Queue-style generation service.
///
/// Implementations must be shareable across the worker pool.
pub trait JobApi: Sync {
    fn submit(&self, model: &str, arguments: &Value) -> ReskinResult<JobHandle>;
    fn status(&self, job: &JobHandle) -> ReskinResult<JobStatus>;
    fn result(&self, job: &JobHandle) -> ReskinResult<Value>;
    fn download(&self, url: &str) -> ReskinResult<Vec<u8>>;

    /// Make a local file addressable by the service.
    fn upload_file(&self, path: &Path) -> ReskinResult<String> {
        data_uri(path)
    }
}

/// Inline a local image as a base64 `data:` URI.
pub fn data_uri(path: &Path) -> ReskinResult<String> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    let mime = match path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    ))
}

/// fal.ai queue REST client.
pub struct FalClient {
    http: reqwest::blocking::Client,
    base_url: String,
    key: String,
}

impl FalClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://queue.fal.run";

    /// Credentials from `FAL_KEY`; base URL from `FAL_QUEUE_URL` when set.
    pub fn from_env() -> ReskinResult<Self> {
        let key = std::env::var("FAL_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ReskinError::precondition("FAL_KEY is not set in the environment"))?;
        let base_url =
            std::env::var("FAL_QUEUE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_owned());
        Self::new(key, base_url)
    }

    pub fn new(key: impl Into<String>, base_url: impl Into<String>) -> ReskinResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| ReskinError::remote(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            key: key.into(),
        })
    }

    fn get_json(&self, url: &str) -> ReskinResult<Value> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.key))
            .send()
            .map_err(|e| ReskinError::remote(format!("GET {url} failed: {e}")))?;
        read_json(resp, url)
    }
}

fn read_json(resp: reqwest::blocking::Response, url: &str) -> ReskinResult<Value> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(ReskinError::remote(format!(
            "{url} returned {status}: {}",
            body.trim()
        )));
    }
    resp.json::<Value>()
        .map_err(|e| ReskinError::remote(format!("invalid JSON from {url}: {e}")))
}

impl JobApi for FalClient {
    fn submit(&self, model: &str, arguments: &Value) -> ReskinResult<JobHandle> {
        let url = format!("{}/{model}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.key))
            .json(arguments)
            .send()
            .map_err(|e| ReskinError::remote(format!("POST {url} failed: {e}")))?;
        let body = read_json(resp, &url)?;
        let mut job: JobHandle = serde_json::from_value(body)
            .map_err(|e| ReskinError::remote(format!("unexpected submit response: {e}")))?;
        job.model = model.to_owned();
        Ok(job)
    }

    fn status(&self, job: &JobHandle) -> ReskinResult<JobStatus> {
        let body = self.get_json(&job.status_url)?;
        JobStatus::from_response(&body)
    }

    fn result(&self, job: &JobHandle) -> ReskinResult<Value> {
        self.get_json(&job.response_url)
    }

    fn download(&self, url: &str) -> ReskinResult<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| ReskinError::remote(format!("download {url} failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReskinError::remote(format!(
                "download {url} returned {status}"
            )));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| ReskinError::remote(format!("download {url} failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/remote/client.rs"]
mod tests;
