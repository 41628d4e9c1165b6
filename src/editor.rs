use tracing::info;

use crate::{
    api::{Payload, Resource, ResourceApi},
    error::Result,
    hooks::ListHook,
    session::SessionStore,
    status::StatusTracker,
};

/// Admin create/update/delete for one collection.
///
/// Every mutation is reflected in [`ResourceEditor::status`] and, on success, the attached
/// list (if any) refetches.
pub struct ResourceEditor<'a, R: Resource> {
    api: ResourceApi<R>,
    list: Option<&'a ListHook<ResourceApi<R>>>,
    status: StatusTracker,
}

impl<'a, R: Resource> ResourceEditor<'a, R> {
    pub fn new(api: ResourceApi<R>) -> Self {
        Self {
            api,
            list: None,
            status: StatusTracker::new(),
        }
    }

    /// Editor for admin screens; refuses users without admin rights.
    pub fn for_admin(session: &SessionStore, api: ResourceApi<R>) -> Result<Self> {
        let admin = session.require_admin()?;
        info!(user = %admin.id, resource = R::LABEL, "admin editor opened");
        Ok(Self::new(api))
    }

    /// Refetch this list after every successful mutation.
    pub fn attach(mut self, list: &'a ListHook<ResourceApi<R>>) -> Self {
        self.list = Some(list);
        self
    }

    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    pub async fn create(&self, payload: Payload) -> Result<R> {
        let record = self
            .status
            .track("create record", self.api.create(payload))
            .await?;
        self.refresh();
        Ok(record)
    }

    pub async fn update(&self, id: &str, payload: Payload) -> Result<R> {
        let record = self
            .status
            .track("update record", self.api.update(id, payload))
            .await?;
        self.refresh();
        Ok(record)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.status
            .track("delete record", self.api.remove(id))
            .await?;
        self.refresh();
        Ok(())
    }

    fn refresh(&self) {
        if let Some(list) = self.list {
            list.refetch();
        }
    }
}
