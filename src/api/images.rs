//! Image management endpoints and the two index spaces used around them.
//!
//! The backend addresses images by position in the *full* list, where the main image sits
//! at 0 and additional images follow from 1. Local editing works on the additional-only
//! list. The two index types below are the only place the offset is applied.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    api::{Resource, ResourceApi},
    error::{ClientError, Result},
    http::{FilePart, MultipartForm, RequestBody},
    models::HasImages,
};

/// Multipart field the backend reads appended images from.
pub const ADDITIONAL_IMAGES_FIELD: &str = "additionalImages";
pub const MAX_UPLOAD_FILES: usize = 5;
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Position in the combined image list (main image at 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullListIndex(usize);

impl FullListIndex {
    pub const MAIN: FullListIndex = FullListIndex(0);

    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn is_main(self) -> bool {
        self.0 == 0
    }

    /// `None` for the main image, which has no place in the additional list.
    pub fn to_additional(self) -> Option<AdditionalListIndex> {
        self.0.checked_sub(1).map(AdditionalListIndex)
    }
}

/// Position in the additional-images-only list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdditionalListIndex(usize);

impl AdditionalListIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn to_full(self) -> FullListIndex {
        FullListIndex(self.0 + 1)
    }
}

/// Full-list indices of `count` additional images in their current order.
pub fn identity_order(count: usize) -> Vec<FullListIndex> {
    (0..count)
        .map(|index| AdditionalListIndex(index).to_full())
        .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReorderBody<'a> {
    image_order: &'a [FullListIndex],
}

impl<R: Resource + HasImages> ResourceApi<R> {
    /// Append images; always multipart under `additionalImages`.
    pub async fn add_images(&self, id: &str, files: Vec<FilePart>) -> Result<()> {
        check_upload_batch(&files)?;
        let path = format!("{}/images", Self::item_path(id)?);
        let count = files.len();

        let form = files
            .into_iter()
            .fold(MultipartForm::new(), |form, mut file| {
                file.field = ADDITIONAL_IMAGES_FIELD.to_string();
                form.file(file)
            });

        let _: Value = self
            .http()
            .post(&path, RequestBody::Multipart(form))
            .await?;
        debug!(resource = R::LABEL, id, count, "appended images");
        Ok(())
    }

    /// Remove one image by full-list index. The main image is rejected without a request.
    pub async fn remove_image(&self, id: &str, index: FullListIndex) -> Result<()> {
        if index.is_main() {
            return Err(ClientError::validation(
                "The main image cannot be removed from the gallery",
            ));
        }
        let path = format!("{}/images/{}", Self::item_path(id)?, index.get());
        let _: Value = self.http().delete(&path).await?;
        debug!(resource = R::LABEL, id, index = index.get(), "removed image");
        Ok(())
    }

    /// Persist a new order for the additional images.
    ///
    /// `order` lists full-list indices (each >= 1) in their new sequence.
    pub async fn reorder_images(&self, id: &str, order: &[FullListIndex]) -> Result<()> {
        check_permutation(order)?;
        let path = format!("{}/images/reorder", Self::item_path(id)?);
        let body = RequestBody::json(&ReorderBody { image_order: order })?;
        let _: Value = self.http().put(&path, body).await?;
        debug!(resource = R::LABEL, id, count = order.len(), "reordered images");
        Ok(())
    }
}

pub(crate) fn check_upload_batch(files: &[FilePart]) -> Result<()> {
    if files.is_empty() {
        return Err(ClientError::validation(
            "Please select at least one file to upload",
        ));
    }
    if files.len() > MAX_UPLOAD_FILES {
        return Err(ClientError::validation(format!(
            "You can only upload a maximum of {MAX_UPLOAD_FILES} files"
        )));
    }
    if let Some(file) = files.iter().find(|file| file.len() > MAX_UPLOAD_BYTES) {
        return Err(ClientError::validation(format!(
            "{} exceeds the {}MB upload limit",
            file.filename,
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

fn check_permutation(order: &[FullListIndex]) -> Result<()> {
    if order.iter().any(|index| index.is_main()) {
        return Err(ClientError::validation(
            "The main image cannot take part in a reorder",
        ));
    }
    let distinct: HashSet<_> = order.iter().collect();
    let in_range = order.iter().all(|index| index.get() <= order.len());
    if distinct.len() != order.len() || !in_range {
        return Err(ClientError::validation(
            "Image order must be a permutation of the additional images",
        ));
    }
    Ok(())
}
