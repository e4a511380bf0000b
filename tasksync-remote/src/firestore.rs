//! Firestore REST v1 client.
//!
//! Documents are addressed as
//! `{base}/v1/projects/{project}/databases/{database}/documents/users/{uid}/{Collection}/{id}`.
//! Merges use update masks so that only the supplied fields are written;
//! single-field updates add a `currentDocument.exists` precondition so a
//! document deleted by another client surfaces as `NotFound` instead of
//! being recreated.

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::store::RemoteStore;
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tasksync_types::{CollectionPath, FieldMap, FieldValue, RemoteDocument, RemoteId};
use tokio::sync::RwLock;
use tracing::debug;

/// A document as the REST API returns it.
#[derive(Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: FieldMap,
}

impl WireDocument {
    /// The document id is the last segment of its resource name.
    fn into_document(self) -> RemoteResult<RemoteDocument> {
        let id = match self.name.rsplit('/').next() {
            Some(id) if !id.is_empty() => RemoteId::new(id),
            _ => {
                return Err(RemoteError::InvalidDocument(format!(
                    "unusable document name {:?}",
                    self.name
                )));
            }
        };
        Ok(RemoteDocument::new(id, self.fields))
    }
}

#[derive(Serialize)]
struct WriteBody<'a> {
    fields: &'a FieldMap,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP client for the Firestore REST API.
pub struct FirestoreClient {
    client: Client,
    config: RemoteConfig,
    token: Arc<RwLock<Option<String>>>,
}

impl FirestoreClient {
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Sets the bearer token sent with every request.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Drops the bearer token. Later requests go out unauthenticated.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn collection_url(&self, path: &CollectionPath) -> String {
        format!("{}/{}", self.config.documents_root(), path)
    }

    fn document_url(&self, path: &CollectionPath, id: &RemoteId) -> String {
        format!("{}/{}/{}", self.config.documents_root(), path, id)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        fields: Option<&FieldMap>,
    ) -> RemoteResult<Response> {
        let mut req = self.client.request(method.clone(), url).query(query);
        if let Some(token) = self.token.read().await.as_deref() {
            req = req.bearer_auth(token);
        }
        if let Some(fields) = fields {
            req = req.json(&WriteBody { fields });
        }
        debug!(%method, url, "firestore request");
        Ok(req.send().await?)
    }
}

/// Maps a non-success response to the error taxonomy. `target` names what
/// was addressed, for the error message.
async fn check(resp: Response, target: &str) -> RemoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthenticated(message),
        StatusCode::FORBIDDEN => RemoteError::PermissionDenied(target.to_string()),
        StatusCode::NOT_FOUND => RemoteError::NotFound(target.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RemoteError::Timeout(format!("{target}: {message}"))
        }
        _ => RemoteError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

fn field_mask<'a>(fields: impl Iterator<Item = &'a String>) -> Vec<(&'static str, String)> {
    fields
        .map(|name| ("updateMask.fieldPaths", name.clone()))
        .collect()
}

#[async_trait]
impl RemoteStore for FirestoreClient {
    async fn list(&self, path: &CollectionPath) -> RemoteResult<Vec<RemoteDocument>> {
        let url = self.collection_url(path);
        let target = path.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", self.config.page_size.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let resp = self.send(Method::GET, &url, &query, None).await?;
            let page: ListResponse = check(resp, &target).await?.json().await?;

            for doc in page.documents {
                documents.push(doc.into_document()?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(collection = %path, count = documents.len(), "listed documents");
        Ok(documents)
    }

    async fn get(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
    ) -> RemoteResult<Option<RemoteDocument>> {
        let url = self.document_url(path, id);
        let resp = self.send(Method::GET, &url, &[], None).await?;
        match check(resp, &format!("{path}/{id}")).await {
            Ok(resp) => {
                let doc: WireDocument = resp.json().await?;
                Ok(Some(doc.into_document()?))
            }
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn add(&self, path: &CollectionPath, fields: &FieldMap) -> RemoteResult<RemoteId> {
        let url = self.collection_url(path);
        let resp = self.send(Method::POST, &url, &[], Some(fields)).await?;
        let doc: WireDocument = check(resp, &path.to_string()).await?.json().await?;
        let doc = doc.into_document()?;
        debug!(collection = %path, remote_id = %doc.id, "added document");
        Ok(doc.id)
    }

    async fn set_merge(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
        fields: &FieldMap,
    ) -> RemoteResult<()> {
        // An empty mask would turn the PATCH into a full overwrite.
        if fields.is_empty() {
            return Ok(());
        }
        let url = self.document_url(path, id);
        let query = field_mask(fields.keys());
        let resp = self.send(Method::PATCH, &url, &query, Some(fields)).await?;
        check(resp, &format!("{path}/{id}")).await?;
        Ok(())
    }

    async fn update_field(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
        field: &str,
        value: FieldValue,
    ) -> RemoteResult<()> {
        let url = self.document_url(path, id);
        let mut fields = FieldMap::new();
        fields.insert(field.to_string(), value);
        let mut query = field_mask(fields.keys());
        query.push(("currentDocument.exists", "true".to_string()));

        let resp = self.send(Method::PATCH, &url, &query, Some(&fields)).await?;
        check(resp, &format!("{path}/{id}")).await?;
        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, id: &RemoteId) -> RemoteResult<()> {
        let url = self.document_url(path, id);
        let resp = self.send(Method::DELETE, &url, &[], None).await?;
        match check(resp, &format!("{path}/{id}")).await {
            Ok(_) | Err(RemoteError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
