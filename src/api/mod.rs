//! Typed wrappers over the portfolio REST endpoints.

pub mod auth;
pub mod certificates;
pub mod images;
pub mod projects;
pub mod reviews;

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{ClientError, Result},
    http::{FilePart, HttpClient, MultipartForm, RequestBody, query_pairs},
    models::{DataEnvelope, ListEnvelope, Pagination},
};

pub use auth::AuthApi;
pub use certificates::{CertificateDraft, CertificateFilters, CertificatesApi};
pub use images::{AdditionalListIndex, FullListIndex};
pub use projects::{ProjectDraft, ProjectFilters, ProjectsApi, SortOrder};
pub use reviews::{ReviewDraft, ReviewFilters, ReviewsApi};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> From<ListEnvelope<T>> for Page<T> {
    fn from(envelope: ListEnvelope<T>) -> Self {
        Self {
            items: envelope.data,
            pagination: envelope.pagination,
        }
    }
}

/// Query object accepted by a list endpoint.
///
/// Two filter values are the same query exactly when they serialize identically.
pub trait ListFilters: Serialize + Clone + Send + Sync + 'static {
    /// Page size requested, if any; lists never show more than this.
    fn limit(&self) -> Option<usize> {
        None
    }
}

/// A backend collection addressable as `/<collection>/:id`.
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const LABEL: &'static str;

    type Filters: ListFilters + Default;

    fn id(&self) -> &str;
}

/// Create/update body. Multipart exactly when file parts are present.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Multipart(MultipartForm),
}

impl Payload {
    pub fn json(value: &impl Serialize) -> Result<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    /// Fields flattened to form keys (`technologies[0]`, ...) plus the given files.
    pub fn multipart(value: &impl Serialize, files: Vec<FilePart>) -> Result<Self> {
        let mut form = MultipartForm::from_value(&serde_json::to_value(value)?)?;
        form.files = files;
        Ok(Payload::Multipart(form))
    }

    /// Pick the encoding from what is being sent.
    pub fn new(value: &impl Serialize, files: Vec<FilePart>) -> Result<Self> {
        if files.is_empty() {
            Self::json(value)
        } else {
            Self::multipart(value, files)
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Payload::Multipart(_))
    }

    fn into_body(self) -> RequestBody {
        match self {
            Payload::Json(value) => RequestBody::Json(value),
            Payload::Multipart(form) => RequestBody::Multipart(form),
        }
    }
}

/// CRUD client for one collection.
pub struct ResourceApi<R> {
    http: HttpClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceApi<R> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceApi<R> {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            _resource: PhantomData,
        }
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    pub(crate) fn item_path(id: &str) -> Result<String> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ClientError::validation(format!("{} id is required", R::LABEL)));
        }
        Ok(format!("{}/{}", R::COLLECTION, id))
    }

    pub async fn list(&self, filters: &R::Filters) -> Result<Page<R>> {
        let query = query_pairs(filters)?;
        let envelope: ListEnvelope<R> = self.http.get(R::COLLECTION, &query).await?;
        debug!(
            resource = R::LABEL,
            count = envelope.data.len(),
            "listed records"
        );
        Ok(envelope.into())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<R> {
        let path = Self::item_path(id)?;
        let envelope: DataEnvelope<R> = self.http.get(&path, &[]).await?;
        Ok(envelope.data)
    }

    pub async fn create(&self, payload: Payload) -> Result<R> {
        let multipart = payload.is_multipart();
        let envelope: DataEnvelope<R> = self
            .http
            .post(R::COLLECTION, payload.into_body())
            .await?;
        debug!(resource = R::LABEL, id = envelope.data.id(), multipart, "created record");
        Ok(envelope.data)
    }

    pub async fn update(&self, id: &str, payload: Payload) -> Result<R> {
        let path = Self::item_path(id)?;
        let multipart = payload.is_multipart();
        let envelope: DataEnvelope<R> = self.http.put(&path, payload.into_body()).await?;
        debug!(resource = R::LABEL, id, multipart, "updated record");
        Ok(envelope.data)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let path = Self::item_path(id)?;
        let _: Value = self.http.delete(&path).await?;
        debug!(resource = R::LABEL, id, "removed record");
        Ok(())
    }
}
