//! Single point of network access: base URL joining, bearer auth and error mapping.

pub mod multipart;

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    storage::{KeyValueStore, stored_token},
};

pub use multipart::{FilePart, MultipartForm};

/// Encoded request body.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn json(value: &impl Serialize) -> Result<Self> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }
}

#[derive(Clone)]
pub struct HttpClient {
    http: Client,
    base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClientError::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        self.request(Method::GET, path, RequestBody::Empty, query)
            .await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: RequestBody) -> Result<T> {
        self.request(Method::POST, path, body, &[]).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: RequestBody) -> Result<T> {
        self.request(Method::PUT, path, body, &[]).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::DELETE, path, RequestBody::Empty, &[])
            .await
    }

    /// Issue a request and decode the JSON response body.
    ///
    /// Attaches the persisted bearer token when present. Does not react to 401s;
    /// callers decide whether a rejection ends the session.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: &[(String, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "dispatching request");

        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = stored_token(self.store.as_ref()) {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form.into_form()?),
        };

        let response = builder.send().await.map_err(|err| {
            warn!(%method, %url, ?err, "request failed before a response arrived");
            ClientError::Network(err.to_string())
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = http_error(status, &text);
            debug!(%method, %url, status = status.as_u16(), message = %err, "request rejected");
            return Err(err);
        }

        let text = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(text).map_err(|err| {
            ClientError::Decode(format!("{method} {path}: {err}"))
        })
    }
}

/// Serialize a filter object into query pairs, dropping unset values.
pub fn query_pairs(filters: &impl Serialize) -> Result<Vec<(String, String)>> {
    match serde_json::to_value(filters)? {
        Value::Null => Ok(Vec::new()),
        value => multipart::form_fields(&value),
    }
}

fn http_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

    ClientError::Http {
        status: status.as_u16(),
        message,
    }
}
