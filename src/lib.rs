//! Client library for the portfolio backend: typed API calls, list state containers,
//! the persisted session, and the image gallery coordinator.

pub mod api;
pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod gallery;
pub mod hooks;
pub mod http;
pub mod models;
pub mod session;
pub mod status;
pub mod storage;
pub mod utils;

pub use api::{
    AdditionalListIndex, AuthApi, CertificateDraft, CertificateFilters, CertificatesApi,
    FullListIndex, Page, Payload, ProjectDraft, ProjectFilters, ProjectsApi, ReviewDraft,
    ReviewFilters, ReviewsApi, SortOrder,
};
pub use api::auth::{LoginRequest, RegisterRequest};
pub use client::PortfolioClient;
pub use config::ClientConfig;
pub use editor::ResourceEditor;
pub use error::{ClientError, Result};
pub use gallery::{ImageGallery, OrderedImages};
pub use hooks::{CertificatesHook, ListHook, ListState, ProjectsHook, ReviewsHook};
pub use http::{FilePart, HttpClient, MultipartForm};
pub use models::{Certificate, Pagination, Project, Review, Role, User};
pub use session::{Credentials, SessionState, SessionStore};
pub use status::{OpStatus, StatusTracker};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
