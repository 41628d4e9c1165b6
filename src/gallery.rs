//! Image list of one project or certificate and the mutations that change it.

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{
    api::{
        AdditionalListIndex, FullListIndex, Resource, ResourceApi,
        images::identity_order,
    },
    error::{ClientError, Result},
    http::FilePart,
    models::HasImages,
    status::StatusTracker,
    utils::image_urls::{HostRewrite, PlaceholderKind, fix_image_url, placeholder_image},
};

/// Main image plus the ordered extra images. The main image never appears in
/// `additional_images`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedImages {
    pub main_image: Option<String>,
    pub additional_images: Vec<String>,
}

impl OrderedImages {
    /// Derive the list from a record, preferring `additionalImages` over `allImages[1..]`.
    pub fn from_record(record: &impl HasImages, rewrite: Option<&HostRewrite>) -> Self {
        let fix = |url: &String| fix_image_url(url, rewrite);

        let main_image = record
            .main_image()
            .map(|url| fix_image_url(url, rewrite))
            .filter(|url| !url.is_empty());

        let additional_images = if !record.additional_images().is_empty() {
            record.additional_images().iter().map(fix).collect()
        } else {
            record.all_images().iter().skip(1).map(fix).collect()
        };

        Self {
            main_image,
            additional_images,
        }
    }

    /// Main image first, then the additional images.
    pub fn combined(&self) -> Vec<&str> {
        self.main_image
            .iter()
            .chain(self.additional_images.iter())
            .map(String::as_str)
            .collect()
    }

    /// Main image, or the placeholder for `kind` when there is none.
    pub fn cover(&self, kind: PlaceholderKind) -> &str {
        self.main_image
            .as_deref()
            .unwrap_or_else(|| placeholder_image(kind))
    }

    /// Move one additional image, as a drag from `source` to `destination` would.
    pub fn move_image(
        &mut self,
        source: AdditionalListIndex,
        destination: AdditionalListIndex,
    ) -> Result<()> {
        let len = self.additional_images.len();
        if source.get() >= len || destination.get() >= len {
            return Err(ClientError::validation("Image position is out of range"));
        }
        let image = self.additional_images.remove(source.get());
        self.additional_images.insert(destination.get(), image);
        Ok(())
    }
}

/// Check a drag between two full-list positions and return their additional-list forms.
fn drag_positions(
    count: usize,
    source: FullListIndex,
    destination: FullListIndex,
) -> Result<(AdditionalListIndex, AdditionalListIndex)> {
    let (Some(from), Some(to)) = (source.to_additional(), destination.to_additional()) else {
        return Err(ClientError::validation(
            "The main image stays first and cannot be reordered",
        ));
    };
    if from.get() >= count || to.get() >= count {
        return Err(ClientError::validation("Image position is out of range"));
    }
    Ok((from, to))
}

/// New order (as full-list indices) after dragging `source` onto `destination`.
pub fn reorder_permutation(
    count: usize,
    source: FullListIndex,
    destination: FullListIndex,
) -> Result<Vec<FullListIndex>> {
    let (from, to) = drag_positions(count, source, destination)?;
    let mut order = identity_order(count);
    let moved = order.remove(from.get());
    order.insert(to.get(), moved);
    Ok(order)
}

/// Coordinates the image list of one record.
pub struct ImageGallery<R: Resource + HasImages> {
    api: ResourceApi<R>,
    id: String,
    rewrite: Option<HostRewrite>,
    images: watch::Sender<OrderedImages>,
    upload: StatusTracker,
    reorder: StatusTracker,
    removal: StatusTracker,
}

impl<R: Resource + HasImages> ImageGallery<R> {
    pub fn new(api: ResourceApi<R>, id: impl Into<String>, rewrite: Option<HostRewrite>) -> Self {
        let (images, _) = watch::channel(OrderedImages::default());
        Self {
            api,
            id: id.into(),
            rewrite,
            images,
            upload: StatusTracker::new(),
            reorder: StatusTracker::new(),
            removal: StatusTracker::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn images(&self) -> OrderedImages {
        self.images.borrow().clone()
    }

    pub fn cover_image(&self) -> String {
        self.images.borrow().cover(R::PLACEHOLDER).to_string()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrderedImages> {
        self.images.subscribe()
    }

    pub fn upload_status(&self) -> &StatusTracker {
        &self.upload
    }

    pub fn reorder_status(&self) -> &StatusTracker {
        &self.reorder
    }

    pub fn removal_status(&self) -> &StatusTracker {
        &self.removal
    }

    /// Fetch the record and replace the local list with the server's.
    pub async fn load(&self) -> Result<R> {
        let record = self.api.get_by_id(&self.id).await?;
        self.images
            .send_replace(OrderedImages::from_record(&record, self.rewrite.as_ref()));
        Ok(record)
    }

    /// Append images, then reload. On failure the current list stays as it is.
    ///
    /// Once the server accepted the files the upload counts as done, even if the reload fails.
    pub async fn upload(&self, files: Vec<FilePart>) -> Result<()> {
        self.upload
            .track("upload images", async {
                self.api.add_images(&self.id, files).await?;
                self.refresh("upload").await;
                Ok(())
            })
            .await
    }

    /// Remove the image at a full-list position. Position 0 is refused without a request.
    pub async fn remove(&self, index: FullListIndex) -> Result<()> {
        self.removal
            .track("remove image", async {
                let Some(local) = index.to_additional() else {
                    return Err(ClientError::validation(
                        "The main image cannot be removed from the gallery",
                    ));
                };
                if local.get() >= self.images.borrow().additional_images.len() {
                    return Err(ClientError::validation("Image position is out of range"));
                }
                self.api.remove_image(&self.id, index).await?;
                self.images.send_if_modified(|images| {
                    if local.get() >= images.additional_images.len() {
                        return false;
                    }
                    images.additional_images.remove(local.get());
                    true
                });
                self.refresh("removal").await;
                Ok(())
            })
            .await
    }

    /// Reload after a mutation the server already applied; a failure only leaves the local copy.
    async fn refresh(&self, after: &str) {
        if let Err(err) = self.load().await {
            warn!(%err, id = %self.id, after, "could not reload images");
        }
    }

    /// Drag-and-drop reorder between two full-list positions.
    ///
    /// The local list changes immediately. If persisting fails, the list is reloaded from the
    /// server rather than reverted by hand. Returns `false` when nothing moved.
    pub async fn reorder(&self, source: FullListIndex, destination: FullListIndex) -> Result<bool> {
        let count = self.images.borrow().additional_images.len();
        let order = match reorder_permutation(count, source, destination) {
            Ok(order) => order,
            Err(err) => {
                self.reorder.fail(&err);
                return Err(err);
            }
        };
        if source == destination {
            return Ok(false);
        }

        self.reorder.begin();
        let mut applied = Ok(());
        self.images.send_modify(|images| {
            if let (Some(from), Some(to)) = (source.to_additional(), destination.to_additional()) {
                applied = images.move_image(from, to);
            }
        });
        if let Err(err) = applied {
            self.reorder.fail(&err);
            return Err(err);
        }

        match self.api.reorder_images(&self.id, &order).await {
            Ok(()) => {
                info!(id = %self.id, from = source.get(), to = destination.get(), "images reordered");
                self.reorder.succeed();
                Ok(true)
            }
            Err(err) => {
                warn!(%err, id = %self.id, "reorder rejected; reloading authoritative order");
                self.reorder.fail(&err);
                if let Err(reload_err) = self.load().await {
                    error!(?reload_err, id = %self.id, "failed to reload images after rejected reorder");
                }
                Err(err)
            }
        }
    }
}
