//! Email worker trigger.
//!
//! Outbound mail is queued in the database and sent by a Supabase Edge
//! Function on a schedule. After writes that enqueue mail (invites, request
//! reviews) the services poke the function so delivery happens right away.
//! Those pokes are fire-and-forget: a failure is logged and the scheduled
//! run picks the mail up later.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bobcats_common::{BobcatsError, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[async_trait]
pub trait EmailTrigger: Send + Sync {
    /// Ask the worker to process pending mail now. Returns the worker's reply.
    async fn trigger(&self) -> Result<Value>;
}

/// Calls `POST {supabase_url}/functions/v1/send-emails`.
pub struct EdgeFunctionTrigger {
    client: Client,
    endpoint: String,
    anon_key: SecretString,
    worker_secret: SecretString,
}

impl EdgeFunctionTrigger {
    pub fn new(
        supabase_url: &str,
        anon_key: SecretString,
        worker_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/functions/v1/send-emails", supabase_url.trim_end_matches('/')),
            anon_key,
            worker_secret,
        })
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }
}

/// Parse the worker's reply body. An empty or non-JSON body still counts as
/// a successful trigger.
fn parse_worker_reply(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({ "success": true, "message": "Email worker triggered" });
    }
    serde_json::from_str(text).unwrap_or_else(|_| {
        json!({ "success": true, "message": "Email worker triggered (response parse failed)" })
    })
}

#[async_trait]
impl EmailTrigger for EdgeFunctionTrigger {
    async fn trigger(&self) -> Result<Value> {
        debug!(endpoint = %self.endpoint, "calling email worker");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.anon_key.expose_secret())
            .header("x-worker-secret", self.worker_secret.expose_secret())
            .json(&json!({}))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| if text.is_empty() { "Failed to trigger email worker".into() } else { text });
            return Err(BobcatsError::Upstream { status: status.as_u16(), message });
        }
        Ok(parse_worker_reply(&text))
    }
}

/// Used when the worker is not configured. Always succeeds.
pub struct NoopTrigger;

#[async_trait]
impl EmailTrigger for NoopTrigger {
    async fn trigger(&self) -> Result<Value> {
        Ok(json!({ "success": true, "skipped": true }))
    }
}

/// Counts calls. Used by tests.
#[derive(Default)]
pub struct RecordingTrigger {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingTrigger {
    pub fn new() -> Self { Self::default() }

    pub fn failing() -> Self { Self { calls: AtomicUsize::new(0), fail: true } }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl EmailTrigger for RecordingTrigger {
    async fn trigger(&self) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BobcatsError::Upstream { status: 500, message: "worker unavailable".into() });
        }
        Ok(json!({ "success": true }))
    }
}

/// Spawn a trigger call without waiting on it.
pub fn fire_and_forget(trigger: Arc<dyn EmailTrigger>, reason: &'static str) -> JoinHandle<()> {
    tokio::spawn(async move {
        match trigger.trigger().await {
            Ok(_) => info!(reason, "email worker triggered"),
            Err(e) => warn!(reason, error = %e, "email worker trigger failed; scheduled run will send"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_supabase_url() {
        let trigger = EdgeFunctionTrigger::new(
            "https://abc.supabase.co/",
            SecretString::from("anon"),
            SecretString::from("secret"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(trigger.endpoint(), "https://abc.supabase.co/functions/v1/send-emails");
    }

    #[test]
    fn test_parse_worker_reply() {
        assert_eq!(parse_worker_reply("")["message"], "Email worker triggered");
        assert_eq!(parse_worker_reply(r#"{"sent":3}"#)["sent"], 3);
        assert_eq!(
            parse_worker_reply("<html>")["message"],
            "Email worker triggered (response parse failed)"
        );
    }

    #[tokio::test]
    async fn test_fire_and_forget_swallows_failure() {
        let trigger = Arc::new(RecordingTrigger::failing());
        fire_and_forget(trigger.clone(), "test").await.unwrap();
        assert_eq!(trigger.calls(), 1);
    }
}
