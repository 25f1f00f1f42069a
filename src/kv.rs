//! Minimal Cloudflare KV client for our use-cases.
//!
//! We only need single-key PUTs plus an up-front credential check. Calls are
//! instrumented and log keys, statuses and payload sizes (not contents).
//!
//! NOTE: We never log the API token and we truncate error bodies to keep the
//! logs readable.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::Error;
use crate::util::trunc_for_log;

const API_BASE: &str = "https://api.cloudflare.com/client/v4";
const UA: &str = "cloudinterview-uploader/0.1";

/// The opaque write capability the upload engine depends on. A failed write
/// is data (a tallied string cause), not control flow, so the error type
/// stays deliberately plain.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
  async fn put(&self, key: &str, value: &[u8]) -> Result<(), String>;
}

/// Cloudflare KV over the REST API. Cheap to clone; the inner reqwest client
/// is shared.
#[derive(Clone)]
pub struct KvStore {
  client: reqwest::Client,
  account_url: String,
  namespace_url: String,
  api_token: String,
}

impl KvStore {
  /// Build the client. The timeout bounds every write; a timed-out write
  /// surfaces as an ordinary failure, never a hang.
  pub fn new(
    account_id: &str,
    namespace_id: &str,
    api_token: &str,
    timeout: Duration,
  ) -> Result<Self, Error> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

    Ok(Self {
      client,
      account_url: format!("{API_BASE}/accounts/{account_id}"),
      namespace_url: format!("{API_BASE}/accounts/{account_id}/storage/kv/namespaces/{namespace_id}"),
      api_token: api_token.to_string(),
    })
  }

  /// URL for one value, with the key percent-encoded as a path segment.
  fn value_url(&self, key: &str) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(&self.namespace_url).map_err(|e| e.to_string())?;
    url
      .path_segments_mut()
      .map_err(|_| "namespace URL cannot be a base".to_string())?
      .push("values")
      .push(key);
    Ok(url)
  }

  /// Verify the token and account id before reading any data. A rejection
  /// here is fatal for the whole run.
  #[instrument(level = "info", skip(self))]
  pub async fn verify_access(&self) -> Result<(), Error> {
    #[derive(Deserialize)]
    struct Envelope {
      success: bool,
      #[serde(default)]
      errors: Vec<ApiError>,
    }
    #[derive(Deserialize)]
    struct ApiError {
      message: String,
    }

    let res = self
      .client
      .get(&self.account_url)
      .header(USER_AGENT, UA)
      .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
      .send()
      .await
      .map_err(|e| Error::Storage(format!("credential check failed: {e}")))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(Error::Storage(format!(
        "credential check failed: HTTP {status}: {}",
        trunc_for_log(&body, 300)
      )));
    }

    let envelope: Envelope = res
      .json()
      .await
      .map_err(|e| Error::Storage(format!("credential check returned unreadable body: {e}")))?;
    if !envelope.success {
      let msg = envelope
        .errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "unknown API error".into());
      return Err(Error::Storage(format!("credential check rejected: {msg}")));
    }

    info!(target: "kv_upload", "Cloudflare credentials verified");
    Ok(())
  }
}

impl KeyValueStore for KvStore {
  #[instrument(level = "debug", skip(self, value), fields(%key, value_len = value.len()))]
  async fn put(&self, key: &str, value: &[u8]) -> Result<(), String> {
    let url = self.value_url(key)?;
    let res = self
      .client
      .put(url)
      .header(USER_AGENT, UA)
      .header(CONTENT_TYPE, "application/octet-stream")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
      .body(value.to_vec())
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(format!("HTTP {status}: {msg}"));
    }
    Ok(())
  }
}

/// Try to extract a clean message from a Cloudflare error envelope.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    errors: Vec<EObj>,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => w.errors.into_iter().next().map(|e| e.message),
    Err(_) => None,
  }
}

#[cfg(test)]
pub(crate) mod testing {
  //! Scripted in-memory store for uploader and pipeline tests.

  use std::collections::{HashMap, HashSet};
  use std::sync::{Arc, Mutex};

  use super::KeyValueStore;

  #[derive(Clone, Default)]
  pub struct MockStore {
    fail_keys: HashSet<String>,
    writes: Arc<Mutex<HashMap<String, Vec<u8>>>>,
  }

  impl MockStore {
    pub fn failing_on(keys: impl IntoIterator<Item = &'static str>) -> Self {
      Self { fail_keys: keys.into_iter().map(str::to_string).collect(), ..Default::default() }
    }

    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
      self.writes.lock().unwrap().get(key).cloned()
    }

    pub fn stored_keys(&self) -> Vec<String> {
      let mut keys: Vec<String> = self.writes.lock().unwrap().keys().cloned().collect();
      keys.sort();
      keys
    }
  }

  impl KeyValueStore for MockStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), String> {
      if self.fail_keys.contains(key) {
        return Err("simulated write failure".into());
      }
      self.writes.lock().unwrap().insert(key.to_string(), value.to_vec());
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn value_url_encodes_keys_as_path_segments() {
    let store = KvStore::new("acct", "ns", "token", Duration::from_secs(5)).unwrap();
    let url = store.value_url("problem:1262").unwrap();
    assert!(url.path().ends_with("/storage/kv/namespaces/ns/values/problem:1262"));

    let tricky = store.value_url("a b/c").unwrap();
    assert!(tricky.path().ends_with("/values/a%20b%2Fc"), "got {}", tricky.path());
  }

  #[test]
  fn api_error_extraction_prefers_the_envelope_message() {
    let body = r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}]}"#;
    assert_eq!(extract_api_error(body).as_deref(), Some("Authentication error"));
    assert_eq!(extract_api_error("not json"), None);
  }
}
