use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;

use crate::utils::image_urls::PlaceholderKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Affiliate,
    Admin,
    SuperAdmin,
    Other(Cow<'static, str>),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Affiliate => "affiliate",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
            Role::Other(value) => value.as_ref(),
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "user" => Role::User,
            "affiliate" => Role::Affiliate,
            "admin" => Role::Admin,
            "superadmin" | "super_admin" | "superAdmin" => Role::SuperAdmin,
            other => Role::Other(Cow::Owned(other.to_string())),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Role::from_str(&value))
    }
}

/// Authenticated account as returned by the backend.
///
/// Role checks are methods over these fields so they can never disagree with the user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub is_admin_approved: bool,
}

impl User {
    pub fn has_admin_rights(&self) -> bool {
        self.is_admin || self.has_super_admin_rights() || self.role == Role::Admin
    }

    pub fn has_super_admin_rights(&self) -> bool {
        self.is_super_admin || self.role == Role::SuperAdmin
    }

    pub fn is_approved_admin(&self) -> bool {
        self.has_super_admin_rights() || (self.has_admin_rights() && self.is_admin_approved)
    }

    pub fn is_affiliate(&self) -> bool {
        self.role == Role::Affiliate
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
}

/// `{ data, pagination }` list response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// `{ data }` single-record response.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub additional_images: Vec<String>,
    #[serde(default)]
    pub all_images: Vec<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub issue_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub credential_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub additional_images: Vec<String>,
    #[serde(default)]
    pub all_images: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(
        default,
        alias = "projectId",
        rename = "project",
        deserialize_with = "id_or_document"
    )]
    pub project_id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Records that carry a main image plus an ordered list of extra images.
pub trait HasImages {
    /// Placeholder shown when the record has no main image.
    const PLACEHOLDER: PlaceholderKind;

    fn main_image(&self) -> Option<&str>;
    fn additional_images(&self) -> &[String];
    /// Combined list with the main image first, when the backend sends it.
    fn all_images(&self) -> &[String];
}

impl HasImages for Project {
    const PLACEHOLDER: PlaceholderKind = PlaceholderKind::Project;

    fn main_image(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn additional_images(&self) -> &[String] {
        &self.additional_images
    }

    fn all_images(&self) -> &[String] {
        &self.all_images
    }
}

impl HasImages for Certificate {
    const PLACEHOLDER: PlaceholderKind = PlaceholderKind::Certificate;

    fn main_image(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn additional_images(&self) -> &[String] {
        &self.additional_images
    }

    fn all_images(&self) -> &[String] {
        &self.all_images
    }
}

// References may arrive as a bare id or as a populated document.
fn id_or_document<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) => Some(id),
        Some(Value::Object(map)) => map
            .get("_id")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}
