use tracing::{debug, error};

use crate::{
    api::{ReviewDraft, ReviewFilters, ReviewsApi},
    error::Result,
    hooks::{ListHook, ListState},
    models::Review,
    status::StatusTracker,
};

/// Reviews for one project plus the submit/delete mutations that keep them in sync.
pub struct ReviewsHook {
    api: ReviewsApi,
    list: ListHook<ReviewsApi>,
    submission: StatusTracker,
}

impl ReviewsHook {
    /// Without a project id nothing is fetched until [`ReviewsHook::set_project`] is called.
    pub fn new(api: ReviewsApi, project_id: Option<String>) -> Result<Self> {
        let list = match project_id {
            Some(id) => ListHook::new(api.clone(), ReviewFilters::for_project(id))?,
            None => ListHook::idle(api.clone(), ReviewFilters::default())?,
        };
        Ok(Self {
            api,
            list,
            submission: StatusTracker::new(),
        })
    }

    pub fn set_project(&self, project_id: impl Into<String>) -> Result<bool> {
        let mut filters = self.list.filters();
        filters.project_id = Some(project_id.into());
        self.list.set_filters(filters)
    }

    pub fn project_id(&self) -> Option<String> {
        self.list.filters().project_id
    }

    pub fn list(&self) -> &ListHook<ReviewsApi> {
        &self.list
    }

    pub fn state(&self) -> ListState<Review> {
        self.list.state()
    }

    /// Inline status for the review form.
    pub fn submission(&self) -> &StatusTracker {
        &self.submission
    }

    pub fn refetch(&self) {
        if self.project_id().is_some() {
            self.list.refetch();
        }
    }

    /// Validate and submit, then refresh the list.
    pub async fn submit_review(&self, draft: ReviewDraft) -> Result<Review> {
        let review = self
            .submission
            .track("submit review", async { self.api.create(&draft).await })
            .await?;
        self.refetch();
        Ok(review)
    }

    /// Delete a review and drop it from the local list.
    pub async fn delete_review(&self, review_id: &str) -> Result<()> {
        match self.api.remove(review_id).await {
            Ok(()) => {
                self.list
                    .update_items(|reviews| reviews.retain(|review| review.id != review_id));
                self.submission.reset();
                debug!(review = review_id, "review deleted");
                Ok(())
            }
            Err(err) => {
                error!(?err, review = review_id, "failed to delete review");
                self.submission.fail(&err);
                Err(err)
            }
        }
    }
}
