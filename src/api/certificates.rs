use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    api::{ListFilters, Resource, ResourceApi, SortOrder},
    models::Certificate,
};

pub type CertificatesApi = ResourceApi<Certificate>;

impl Resource for Certificate {
    const COLLECTION: &'static str = "/certificates";
    const LABEL: &'static str = "certificate";

    type Filters = CertificateFilters;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListFilters for CertificateFilters {
    fn limit(&self) -> Option<usize> {
        self.limit.map(|limit| limit as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDraft {
    pub title: String,
    pub issuer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub description: String,
    pub featured: bool,
    pub order: i32,
}

impl From<&Certificate> for CertificateDraft {
    fn from(certificate: &Certificate) -> Self {
        Self {
            title: certificate.title.clone(),
            issuer: certificate.issuer.clone(),
            issue_date: certificate.issue_date.map(|date| date.date_naive()),
            expiry_date: certificate.expiry_date.map(|date| date.date_naive()),
            credential_id: certificate.credential_id.clone(),
            credential_url: certificate.credential_url.clone(),
            image_url: certificate.image_url.clone(),
            description: certificate.description.clone(),
            featured: certificate.featured,
            order: certificate.order,
        }
    }
}
