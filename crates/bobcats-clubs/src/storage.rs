//! Object storage for request and club images.
//!
//! Production uploads go to Supabase Storage over its REST API:
//! `POST {url}/storage/v1/object/{bucket}/{path}` with `x-upsert: true`;
//! removals are `DELETE {url}/storage/v1/object/{bucket}` with the paths
//! listed as `prefixes`.
//! Public objects are served from `{url}/storage/v1/object/public/{bucket}/{path}`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bobcats_common::{BobcatsError, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use serde_json::json;
use tracing::{debug, instrument};

pub const STORAGE_BUCKET: &str = "club-assets";

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `bytes` at `path`, replacing any existing object.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Delete the objects at `paths`. Missing objects are not an error.
    async fn remove(&self, paths: &[String]) -> Result<()>;

    fn public_url(&self, path: &str) -> String;
}

fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!("{}/storage/v1/object/public/{}/{}", base_url.trim_end_matches('/'), bucket, path)
}

// ── Supabase ──────────────────────────────────────────────────────────────────

pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: SecretString,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: impl Into<String>, service_key: SecretString, bucket: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let key = self.service_key.expose_secret();
        let resp = self
            .client
            .post(&url)
            .bearer_auth(key)
            .header("apikey", key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BobcatsError::Storage(format!("upload of {path} failed ({status}): {body}")));
        }
        debug!(path, "uploaded object");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let key = self.service_key.expose_secret();
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(key)
            .header("apikey", key)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BobcatsError::Storage(format!("removal of {} objects failed ({status}): {body}", paths.len())));
        }
        debug!(count = paths.len(), "removed objects");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.base_url, &self.bucket, path)
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Keeps objects in a map. Used when Supabase is not configured and in tests.
pub struct MemoryStorage {
    base_url: String,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    fail_uploads: AtomicBool,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn set_fail_uploads(&self, fail: bool) { self.fail_uploads.store(fail, Ordering::SeqCst); }

    /// Content type and bytes stored at `path`.
    pub async fn get(&self, path: &str) -> Option<(String, Vec<u8>)> {
        self.objects.lock().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize { self.objects.lock().await.len() }
}

impl Default for MemoryStorage {
    fn default() -> Self { Self::new("http://localhost:54321") }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(BobcatsError::Storage(format!("upload of {path} failed")));
        }
        self.objects
            .lock()
            .await
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().await;
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.base_url, STORAGE_BUCKET, path)
    }
}
