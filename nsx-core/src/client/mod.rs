//! HTTP access to the NSX Manager API.
//!
//! [`NsxClient`] is the `reqwest` implementation of [`NsxApi`]. Every request is
//! authenticated with HTTP Basic, carries the configured timeout and goes through
//! [`retry::with_backoff`]. Creates are only repeated when the connection could not
//! be established.

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod response;
pub mod retry;

use async_trait::async_trait;
use log::{debug, info, warn};
use nsx::{ApiError, NsxApi, NsxConnection, ObjectId, ObjectKind, RetryPolicy};
use reqwest::{Client, Method};
use response::{handle_response, transport_failure};
use retry::Replay;
use serde_json::Value;

const EULA_ACCEPT_PATH: &str = "/api/v1/eula/accept";

/// Client bound to one NSX Manager.
#[derive(Clone)]
pub struct NsxClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    retry: RetryPolicy,
}

impl NsxClient {
    /// Builds a client for `connection`.
    ///
    /// With `validate_certs = false` the TLS chain is not verified and a warning is
    /// logged.
    pub fn new(connection: &NsxConnection) -> Result<Self, ApiError> {
        let mut builder = Client::builder().timeout(connection.request_timeout());
        if !connection.validate_certs {
            warn!(
                "TLS certificate validation is disabled for {}",
                connection.mgmt_ip
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        info!("NSX client ready for {}", connection.base_url());
        Ok(Self {
            http,
            base_url: connection.base_url(),
            username: connection.username.clone(),
            password: connection.password.clone(),
            retry: connection.retry.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        replay: Replay,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let label = format!("{} {}", method, path);
        retry::with_backoff(&self.retry, &label, replay, |attempt| {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .basic_auth(&self.username, Some(&self.password))
                .query(query);
            if let Some(body) = body {
                request = request.json(body);
            }
            let method = method.as_str().to_string();
            async move {
                debug!("{} {} (attempt {})", method, path, attempt);
                let resp = request.send().await.map_err(transport_failure)?;
                handle_response(resp, &method, path).await
            }
        })
        .await
    }
}

fn item_path(kind: ObjectKind, id: &ObjectId) -> String {
    format!("{}/{}", kind.collection_path(), id)
}

/// Query for one page of `kind`: its fixed parameters, then the cursor if any.
fn page_query<'a>(kind: ObjectKind, cursor: Option<&'a str>) -> Vec<(&'a str, &'a str)> {
    let mut query = kind.list_query().to_vec();
    if let Some(cursor) = cursor {
        query.push(("cursor", cursor));
    }
    query
}

#[async_trait]
impl NsxApi for NsxClient {
    async fn list(&self, kind: ObjectKind) -> Result<Vec<Value>, ApiError> {
        let path = kind.collection_path();
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let query = page_query(kind, cursor.as_deref());
            let page = self
                .request(Method::GET, path, &query, None, Replay::Safe)
                .await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    ApiError::InvalidResponse(format!("GET {}: missing 'results' array", path))
                })?;
            objects.extend(results.iter().cloned());

            match page.get("cursor").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => cursor = Some(next.to_string()),
                _ => break,
            }
        }
        debug!("GET {}: {} object(s)", path, objects.len());
        Ok(objects)
    }

    async fn create(&self, kind: ObjectKind, body: &Value) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            kind.collection_path(),
            &[],
            Some(body),
            Replay::ConnectOnly,
        )
        .await
    }

    async fn update(&self, kind: ObjectKind, id: &ObjectId, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, &item_path(kind, id), &[], Some(body), Replay::Safe)
            .await
    }

    async fn delete(&self, kind: ObjectKind, id: &ObjectId) -> Result<(), ApiError> {
        self.request(Method::DELETE, &item_path(kind, id), &[], None, Replay::Safe)
            .await
            .map(|_| ())
    }

    async fn accept_eula(&self) -> Result<(), ApiError> {
        self.request(Method::POST, EULA_ACCEPT_PATH, &[], None, Replay::Safe)
            .await
            .map(|_| ())
    }
}
