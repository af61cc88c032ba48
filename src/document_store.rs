//! Client for a Firestore-compatible document store, spoken over its REST API.
//!
//! Documents are plain JSON objects on our side; they are translated to the
//! store's typed value representation on the way out.
use crate::credentials::{AccessTokenProvider, CredentialsError};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::{json, Map, Value};

/// Identifier generated by the store for a newly inserted document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DocumentId(String);

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Failed to serialize the record")]
    Serialization(#[from] serde_json::Error),
    #[error("Only JSON objects can be stored as documents")]
    NotADocument,
    #[error("Failed to obtain a document store access token")]
    Credentials(#[from] CredentialsError),
    #[error("The document store request failed")]
    Request(#[from] reqwest::Error),
    #[error("The document store did not return a document name")]
    MissingDocumentName,
}

pub struct DocumentStoreClient {
    http_client: Client,
    base_url: String,
    database_path: String,
    credentials: AccessTokenProvider,
}

impl DocumentStoreClient {
    pub fn new(
        base_url: String,
        project_id: &str,
        database_id: &str,
        credentials: AccessTokenProvider,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            database_path: format!("projects/{}/databases/{}", project_id, database_id),
            credentials,
        })
    }

    /// Appends `record` to `collection` and returns the identifier the store
    /// generated for it. There is no idempotency key: inserting the same
    /// record twice creates two documents.
    #[tracing::instrument(name = "Inserting a document", skip(self, record))]
    pub async fn insert_document<T: serde::Serialize>(
        &self,
        collection: &str,
        record: &T,
    ) -> Result<DocumentId, StoreError> {
        let fields = match serde_json::to_value(record)? {
            Value::Object(map) => encode_fields(&map),
            _ => return Err(StoreError::NotADocument),
        };
        let url = format!(
            "{}/v1/{}/documents/{}",
            self.base_url, self.database_path, collection
        );
        let access_token = self.credentials.access_token().await?;
        let created: CreatedDocument = self
            .http_client
            .post(&url)
            .bearer_auth(access_token.expose_secret())
            .json(&json!({ "fields": fields }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        created
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(|id| DocumentId(id.to_string()))
            .ok_or(StoreError::MissingDocumentName)
    }
}

#[derive(serde::Deserialize)]
struct CreatedDocument {
    // Full resource path, `projects/{p}/databases/{d}/documents/{collection}/{id}`
    #[serde(default)]
    name: String,
}

fn encode_fields(map: &Map<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // 64-bit integers travel as decimal strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}
