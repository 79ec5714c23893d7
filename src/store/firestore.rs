//! Cloud Firestore backend over the v1 REST API.
//!
//! Reads use `GET .../documents/{collection}/{id}` (404 means absent).
//! Writes use a single `documents:commit` with an `update` carrying the set
//! fields, an `updateMask` limited to those fields (merge semantics), and
//! `updateTransforms` with server-side `increment`s, so concurrent writers
//! never lose each other's increments.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::{Map, Value, json};

use super::{CheckInStore, Document, DocumentWrite, FieldPath, validate_key};
use crate::errors::StoreError;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    collection: String,
    bearer_token: Option<String>,
    api_key: Option<String>,
}

impl FirestoreStore {
    pub fn new(project_id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            collection: collection.into(),
            bearer_token: None,
            api_key: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    /// Resource name of a document, as used inside request bodies.
    pub fn document_name(&self, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path(), self.collection, id)
    }

    fn url(&self, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::Other(anyhow::anyhow!("Invalid Firestore base URL: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Other(anyhow::anyhow!("Firestore base URL cannot be a base"))
            })?;
            segments.pop_if_empty();
            segments.extend(["projects", self.project_id.as_str(), "databases", "(default)"]);
            segments.extend(tail);
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Body of the `commit` call for one merge write.
    pub fn commit_body(&self, id: &str, write: &DocumentWrite) -> Value {
        let fields: Map<String, Value> = write
            .set
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect();
        let field_paths: Vec<String> = write.set.keys().map(|k| quote_segment(k)).collect();
        let transforms: Vec<Value> = write
            .increments
            .iter()
            .map(|(path, by)| {
                json!({
                    "fieldPath": encode_field_path(path),
                    "increment": { "integerValue": by.to_string() },
                })
            })
            .collect();

        let mut op = json!({
            "update": { "name": self.document_name(id), "fields": fields },
            "updateMask": { "fieldPaths": field_paths },
        });
        if !transforms.is_empty() {
            op["updateTransforms"] = Value::Array(transforms);
        }
        json!({ "writes": [op] })
    }
}

async fn remote_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Remote { status, body }
}

#[async_trait]
impl CheckInStore for FirestoreStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        validate_key(key)?;
        let url = self.url(&["documents", self.collection.as_str(), key])?;
        let resp = self.authorize(self.http.get(url)).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(remote_error(resp).await);
        }
        let body: Value = resp.json().await?;
        let fields = match body.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields),
            Some(other) => {
                return Err(StoreError::Malformed(format!(
                    "expected 'fields' object, got {other}"
                )));
            }
            None => Document::new(),
        };
        Ok(Some(fields))
    }

    async fn merge_upsert(&self, key: &str, write: DocumentWrite) -> Result<(), StoreError> {
        validate_key(key)?;
        let url = self.url(&["documents:commit"])?;
        let body = self.commit_body(key, &write);
        tracing::debug!(document = %self.document_name(key), "firestore commit");

        let resp = self
            .authorize(self.http.post(url))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(remote_error(resp).await);
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}

/// Quote a field path segment unless it is a simple identifier.
fn quote_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        segment.to_string()
    } else {
        let escaped = segment.replace('\\', "\\\\").replace('`', "\\`");
        format!("`{escaped}`")
    }
}

pub fn encode_field_path(path: &FieldPath) -> String {
    path.segments()
        .iter()
        .map(|s| quote_segment(s))
        .collect::<Vec<_>>()
        .join(".")
}

/// JSON value → Firestore typed `Value`.
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
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Firestore typed `Value` → JSON value. Unknown kinds decode to null.
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    if let Some(s) = obj.get("integerValue") {
        // Integers arrive as decimal strings.
        return match s {
            Value::String(text) => text.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            Value::Number(n) => Value::Number(n.clone()),
            _ => Value::Null,
        };
    }
    if let Some(d) = obj.get("doubleValue") {
        return d.clone();
    }
    if let Some(s) = obj.get("stringValue") {
        return s.clone();
    }
    if let Some(b) = obj.get("booleanValue") {
        return b.clone();
    }
    if let Some(ts) = obj.get("timestampValue") {
        return ts.clone();
    }
    if let Some(array) = obj.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = obj.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(Value::as_object)
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }
    Value::Null
}

pub fn decode_fields(fields: &Map<String, Value>) -> Document {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}
