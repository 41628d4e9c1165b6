use std::sync::Arc;

use tracing::info;

use crate::{
    api::{
        AuthApi, CertificateFilters, CertificatesApi, ProjectFilters, ProjectsApi, ReviewsApi,
        ResourceApi,
    },
    config::ClientConfig,
    error::Result,
    gallery::ImageGallery,
    hooks::{self, CertificatesHook, ProjectsHook, ReviewsHook},
    http::HttpClient,
    models::{Certificate, Project},
    session::SessionStore,
    storage::{FileStore, KeyValueStore},
};

/// Everything a front end needs, wired to one backend and one persisted session.
#[derive(Clone)]
pub struct PortfolioClient {
    config: ClientConfig,
    http: HttpClient,
    session: SessionStore,
}

impl PortfolioClient {
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let http = HttpClient::new(&config, Arc::clone(&store))?;
        let session = SessionStore::new(AuthApi::new(http.clone()), store);
        info!(api_url = %config.api_url, "portfolio client ready");
        Ok(Self {
            config,
            http,
            session,
        })
    }

    /// Client whose session lives in files under `config.state_dir`.
    pub fn with_file_store(config: ClientConfig) -> Result<Self> {
        let store = FileStore::open(&config.state_dir)?;
        Self::new(config, Arc::new(store))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.http.clone())
    }

    pub fn projects(&self) -> ProjectsApi {
        ResourceApi::new(self.http.clone())
    }

    pub fn certificates(&self) -> CertificatesApi {
        ResourceApi::new(self.http.clone())
    }

    pub fn reviews(&self) -> ReviewsApi {
        ReviewsApi::new(self.http.clone())
    }

    pub fn use_projects(&self, filters: ProjectFilters) -> Result<ProjectsHook> {
        hooks::use_projects(self.projects(), filters)
    }

    pub fn use_certificates(&self, filters: CertificateFilters) -> Result<CertificatesHook> {
        hooks::use_certificates(self.certificates(), filters)
    }

    pub fn use_reviews(&self, project_id: Option<String>) -> Result<ReviewsHook> {
        ReviewsHook::new(self.reviews(), project_id)
    }

    pub fn project_gallery(&self, project_id: impl Into<String>) -> ImageGallery<Project> {
        ImageGallery::new(
            self.projects(),
            project_id,
            self.config.asset_rewrite.clone(),
        )
    }

    pub fn certificate_gallery(
        &self,
        certificate_id: impl Into<String>,
    ) -> ImageGallery<Certificate> {
        ImageGallery::new(
            self.certificates(),
            certificate_id,
            self.config.asset_rewrite.clone(),
        )
    }
}
