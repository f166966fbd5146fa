use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    foundation::error::{ReskinError, ReskinResult},
    remote::client::JobApi,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Queue state of a submitted job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Queued { position: Option<u64> },
    InProgress,
    Completed,
}

#[derive(Deserialize)]
struct RawStatus {
    status: String,
    #[serde(default)]
    queue_position: Option<u64>,
}

impl JobStatus {
    /// Parse a queue status body such as `{"status": "IN_QUEUE", "queue_position": 3}`.
    pub fn from_response(body: &Value) -> ReskinResult<Self> {
        let raw = RawStatus::deserialize(body)
            .map_err(|e| ReskinError::remote(format!("malformed status response: {e}")))?;
        match raw.status.as_str() {
            "IN_QUEUE" => Ok(Self::Queued {
                position: raw.queue_position,
            }),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(ReskinError::remote(format!(
                "unrecognised job status '{other}'"
            ))),
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A submitted request and where to ask about it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct JobHandle {
    #[serde(default)]
    pub model: String,
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
}

fn url_of(v: &Value) -> Option<String> {
    v.get("url").and_then(Value::as_str).map(str::to_owned)
}

fn first_url(result: &Value, single: &str, list: &str) -> Option<String> {
    result
        .get(single)
        .and_then(url_of)
        .or_else(|| {
            result
                .get(list)
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(url_of)
        })
}

/// `{"image": {"url"}}` or the first of `{"images": [{"url"}]}`.
pub fn image_url(result: &Value) -> ReskinResult<String> {
    first_url(result, "image", "images")
        .ok_or_else(|| ReskinError::remote(format!("no image URL in result: {result}")))
}

/// `{"video": {"url"}}` or the first of `{"videos": [{"url"}]}`.
pub fn video_url(result: &Value) -> ReskinResult<String> {
    first_url(result, "video", "videos")
        .ok_or_else(|| ReskinError::remote(format!("no video URL in result: {result}")))
}

/// Every URL in `{"images": [...]}`, in order. Entries without a URL are skipped.
pub fn image_urls(result: &Value) -> Vec<String> {
    result
        .get("images")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(url_of).collect())
        .unwrap_or_default()
}

/// Poll until the job completes, then fetch its result.
#[tracing::instrument(skip(api, job), fields(model = %job.model, request = %job.request_id))]
pub fn wait_for_completion(
    api: &dyn JobApi,
    job: &JobHandle,
    interval: Duration,
) -> ReskinResult<Value> {
    let mut last = None;
    loop {
        let status = api.status(job)?;
        if last != Some(status) {
            tracing::debug!(?status, "job status");
            last = Some(status);
        }
        if status.is_done() {
            return api.result(job);
        }
        std::thread::sleep(interval);
    }
}

/// Submit and wait in one call.
pub fn run_job(
    api: &dyn JobApi,
    model: &str,
    arguments: &Value,
    interval: Duration,
) -> ReskinResult<Value> {
    let job = api.submit(model, arguments)?;
    tracing::info!(model, request = %job.request_id, "submitted");
    wait_for_completion(api, &job, interval)
}

#[cfg(test)]
#[path = "../../tests/unit/remote/job.rs"]
mod tests;
