use serde::{Deserialize, Serialize};

use crate::{
    api::{ListFilters, Resource, ResourceApi},
    models::Project,
};

pub type ProjectsApi = ResourceApi<Project>;

impl Resource for Project {
    const COLLECTION: &'static str = "/projects";
    const LABEL: &'static str = "project";

    type Filters = ProjectFilters;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ProjectFilters {
    pub fn featured(limit: u32) -> Self {
        Self {
            featured: Some(true),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(order);
        self
    }
}

impl ListFilters for ProjectFilters {
    fn limit(&self) -> Option<usize> {
        self.limit.map(|limit| limit as usize)
    }
}

/// Admin form contents for creating or editing a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    pub featured: bool,
    pub order: i32,
}

impl ProjectDraft {
    /// Parse the comma-separated technologies input used by the admin form.
    pub fn set_technologies(&mut self, raw: &str) {
        self.technologies = raw
            .split(',')
            .map(str::trim)
            .filter(|tech| !tech.is_empty())
            .map(str::to_string)
            .collect();
    }
}

impl From<&Project> for ProjectDraft {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            technologies: project.technologies.clone(),
            image_url: project.image_url.clone(),
            live_url: project.live_url.clone(),
            github_url: project.github_url.clone(),
            featured: project.featured,
            order: project.order,
        }
    }
}
