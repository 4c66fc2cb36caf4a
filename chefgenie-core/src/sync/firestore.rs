//! Household documents stored in Cloud Firestore through its REST API.
//!
//! Documents live at `households/{code}`. Firestore stores typed values, so
//! bundles are converted between plain JSON and the `{"stringValue": ..}`
//! style encoding on the way in and out. Live changes are detected by
//! polling the document's `updateTime`.

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::SyncError;
use super::store::{DocumentSnapshot, DocumentStore};
use crate::household::HouseholdCode;
use crate::models::SyncData;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const COLLECTION: &str = "households";
/// Own writes remembered for pending-write detection.
const RECENT_WRITES: usize = 16;

/// Encodes plain JSON as a Firestore `Value`.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Decodes a Firestore `Value` back to plain JSON.
pub fn decode_value(value: &Value) -> Result<Value, SyncError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(SyncError::Decode(format!("not a typed value: {}", value)));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| SyncError::Decode(format!("bad integerValue: {}", inner)))
        }
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Ok(Value::Object(decode_fields(fields)?)),
            _ => Ok(Value::Object(Map::new())),
        },
        other => Err(SyncError::Decode(format!("unsupported value type {}", other))),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, SyncError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    update_time: String,
}

impl Document {
    fn decode(&self) -> Result<SyncData, SyncError> {
        let plain = Value::Object(decode_fields(&self.fields)?);
        Ok(serde_json::from_value(plain)?)
    }
}

struct Inner {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    poll_interval: Duration,
    /// `updateTime`s of the most recent documents this handle wrote, oldest first
    recent_writes: Mutex<VecDeque<String>>,
}

/// Firestore-backed [`DocumentStore`].
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<Inner>,
}

impl FirestoreStore {
    pub fn new(project_id: impl Into<String>, api_key: Option<String>) -> Self {
        Self::build(
            reqwest::Client::new(),
            DEFAULT_BASE_URL.to_string(),
            project_id.into(),
            api_key,
            DEFAULT_POLL_INTERVAL,
        )
    }

    fn build(
        client: reqwest::Client,
        base_url: String,
        project_id: String,
        api_key: Option<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                base_url,
                project_id,
                api_key,
                poll_interval,
                recent_writes: Mutex::new(VecDeque::new()),
            }),
        }
    }

    fn rebuild(self, f: impl FnOnce(&mut String, &mut Duration)) -> Self {
        let mut base_url = self.inner.base_url.clone();
        let mut poll_interval = self.inner.poll_interval;
        f(&mut base_url, &mut poll_interval);
        Self::build(
            self.inner.client.clone(),
            base_url,
            self.inner.project_id.clone(),
            self.inner.api_key.clone(),
            poll_interval,
        )
    }

    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        self.rebuild(|base, _| *base = url)
    }

    pub fn with_poll_interval(self, interval: Duration) -> Self {
        self.rebuild(|_, poll| *poll = interval)
    }

    fn document_url(&self, code: &HouseholdCode) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.inner.base_url,
            self.inner.project_id,
            COLLECTION,
            urlencoding::encode(code.as_str())
        )
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    /// Whether this handle wrote the document revision stamped `update_time`.
    fn wrote(&self, update_time: &str) -> bool {
        self.inner
            .recent_writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|t| t == update_time)
    }

    fn record_write(&self, update_time: String) {
        let mut writes = self
            .inner
            .recent_writes
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if writes.len() == RECENT_WRITES {
            writes.pop_front();
        }
        writes.push_back(update_time);
    }

    async fn fetch(&self, code: &HouseholdCode) -> Result<Option<Document>, SyncError> {
        let response = self
            .with_key(self.inner.client.get(self.document_url(code)))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status(status.as_u16(), body));
        }
        Ok(Some(response.json().await?))
    }

    async fn write(&self, code: &HouseholdCode, data: &SyncData) -> Result<(), SyncError> {
        let plain = match serde_json::to_value(data) {
            Ok(Value::Object(map)) => map,
            Ok(other) => return Err(SyncError::Encode(format!("not an object: {}", other))),
            Err(e) => return Err(SyncError::Encode(e.to_string())),
        };
        let body = json!({ "fields": encode_fields(&plain) });

        // PATCH without an update mask replaces the whole document.
        let response = self
            .with_key(self.inner.client.patch(self.document_url(code)))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Firestore write for {} failed with {}", code, status);
            return Err(SyncError::Status(status.as_u16(), body));
        }

        let written: Document = response.json().await?;
        self.record_write(written.update_time);
        Ok(())
    }

    /// One poll: a snapshot if the document changed since `seen`.
    async fn poll(
        &self,
        code: &HouseholdCode,
        seen: &mut Option<Option<String>>,
    ) -> Option<DocumentSnapshot> {
        let document = match self.fetch(code).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Polling {} failed: {}", code, e);
                return None;
            }
        };

        let update_time = document.as_ref().map(|d| d.update_time.clone());
        if seen.as_ref() == Some(&update_time) {
            return None;
        }
        *seen = Some(update_time.clone());

        let data = match document.as_ref().map(Document::decode).transpose() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Ignoring undecodable document {}: {}", code, e);
                return None;
            }
        };
        let has_pending_writes = update_time.as_deref().is_some_and(|t| self.wrote(t));
        Some(DocumentSnapshot {
            data,
            has_pending_writes,
        })
    }
}

impl DocumentStore for FirestoreStore {
    fn get<'a>(
        &'a self,
        code: &'a HouseholdCode,
    ) -> BoxFuture<'a, Result<Option<SyncData>, SyncError>> {
        Box::pin(async move {
            match self.fetch(code).await? {
                Some(document) => Ok(Some(document.decode()?)),
                None => Ok(None),
            }
        })
    }

    fn set<'a>(
        &'a self,
        code: &'a HouseholdCode,
        data: &'a SyncData,
    ) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(self.write(code, data))
    }

    fn watch(&self, code: &HouseholdCode) -> BoxStream<'static, DocumentSnapshot> {
        let store = self.clone();
        let code = code.clone();
        // None: nothing observed yet. Some(None): observed a missing document.
        let seen: Option<Option<String>> = None;

        stream::unfold(
            (store, code, seen),
            |(store, code, mut seen)| async move {
                loop {
                    if seen.is_some() {
                        tokio::time::sleep(store.inner.poll_interval).await;
                    }
                    if let Some(snapshot) = store.poll(&code, &mut seen).await {
                        return Some((snapshot, (store, code, seen)));
                    }
                    if seen.is_none() {
                        // First read failed; wait before retrying.
                        tokio::time::sleep(store.inner.poll_interval).await;
                    }
                }
            },
        )
        .boxed()
    }
}
