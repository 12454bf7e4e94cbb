use std::sync::Arc;

use chrono::Utc;
use mime::Mime;
use tracing::{info, warn};

use super::area::AreaNormalizer;
use super::domain::{
    Facility, ImageId, Listing, ListingId, ListingSubmission, Principal, PrincipalId,
    PropertyImage,
};
use super::repository::{ImageStore, ImageStoreError, ListingRepository, RepositoryError};
use super::search::{ListingPage, ListingQuery};
use super::taxonomy::{District, State};
use super::validation::{ListingGuard, ListingPolicy, ListingValidationError};

/// Image bytes plus the metadata a client sends alongside them.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: Mime,
    pub bytes: Vec<u8>,
    pub caption: Option<String>,
    pub is_thumbnail: bool,
}

/// Service composing validation, area normalization, storage and image handling.
///
/// Every write goes through [`ListingService::persist_new`] or
/// [`ListingService::persist_existing`], which normalize land units first.
pub struct ListingService<R, S> {
    guard: Arc<ListingGuard>,
    normalizer: AreaNormalizer,
    repository: Arc<R>,
    images: Arc<S>,
}

impl<R, S> ListingService<R, S>
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    pub fn new(repository: Arc<R>, images: Arc<S>, policy: ListingPolicy) -> Self {
        let guard = ListingGuard::new(policy, Default::default(), Default::default());
        Self::with_guard(guard, repository, images)
    }

    pub fn with_guard(guard: ListingGuard, repository: Arc<R>, images: Arc<S>) -> Self {
        Self {
            guard: Arc::new(guard),
            normalizer: AreaNormalizer::new(),
            repository,
            images,
        }
    }

    pub fn create(
        &self,
        principal: &Principal,
        submission: ListingSubmission,
    ) -> Result<Listing, ListingServiceError> {
        let validated = self.guard.validate(submission)?;
        let now = Utc::now();
        let listing = Listing {
            id: ListingId::UNASSIGNED,
            owner: principal.id.clone(),
            details: validated.details,
            land: validated.land,
            facilities: validated.facilities,
            images: Vec::new(),
            last_image_id: 0,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let stored = self.persist_new(listing)?;
        info!(
            listing_id = %stored.id,
            owner = %stored.owner,
            total_area_sqft = ?stored.land.total_area_sqft,
            "listing created"
        );
        Ok(stored)
    }

    /// Replaces the editable attributes of a listing. Images and ownership are kept.
    pub fn update(
        &self,
        principal: &Principal,
        id: ListingId,
        submission: ListingSubmission,
    ) -> Result<Listing, ListingServiceError> {
        let mut listing = self.editable(principal, id)?;
        let validated = self.guard.validate(submission)?;

        listing.details = validated.details;
        listing.land = validated.land;
        listing.facilities = validated.facilities;
        listing.updated_at = Utc::now();

        self.persist_existing(&mut listing)?;
        info!(
            listing_id = %listing.id,
            editor = %principal.id,
            total_area_sqft = ?listing.land.total_area_sqft,
            "listing updated"
        );
        Ok(listing)
    }

    pub fn delete(&self, principal: &Principal, id: ListingId) -> Result<(), ListingServiceError> {
        let listing = self.editable(principal, id)?;
        self.repository.delete(id)?;

        for image in &listing.images {
            if let Err(err) = self.images.remove(&image.image) {
                warn!(listing_id = %id, image = %image.image, error = %err, "orphaned listing image");
            }
        }
        info!(listing_id = %id, editor = %principal.id, "listing deleted");
        Ok(())
    }

    /// Inactive listings are only visible to principals who may edit them.
    pub fn get(
        &self,
        viewer: Option<&Principal>,
        id: ListingId,
    ) -> Result<Listing, ListingServiceError> {
        let listing = self.fetch(id)?;
        let visible = listing.details.is_active
            || viewer.is_some_and(|principal| principal.can_edit(&listing));
        if !visible {
            return Err(ListingServiceError::NotFound(id));
        }
        Ok(listing)
    }

    pub fn search(&self, query: &ListingQuery) -> Result<ListingPage, ListingServiceError> {
        let listings = self.repository.all()?;
        Ok(query.apply(listings))
    }

    pub fn attach_image(
        &self,
        principal: &Principal,
        id: ListingId,
        upload: ImageUpload,
    ) -> Result<PropertyImage, ListingServiceError> {
        let mut listing = self.editable(principal, id)?;

        if upload.bytes.is_empty() {
            return Err(ListingServiceError::EmptyImage);
        }
        if upload.content_type.type_() != mime::IMAGE {
            return Err(ListingServiceError::UnsupportedImage(
                upload.content_type.to_string(),
            ));
        }

        let image_id = listing.next_image_id();
        let key = format!("listings/{}/{}", listing.id, image_id);
        let reference = self
            .images
            .store(&key, &upload.content_type, &upload.bytes)?;

        if upload.is_thumbnail {
            for image in &mut listing.images {
                image.is_thumbnail = false;
            }
        }
        let image = PropertyImage {
            id: image_id,
            image: reference,
            caption: upload
                .caption
                .map(|caption| caption.trim().to_string())
                .filter(|caption| !caption.is_empty()),
            is_thumbnail: upload.is_thumbnail,
        };
        listing.images.push(image.clone());
        listing.updated_at = Utc::now();

        if let Err(err) = self.persist_existing(&mut listing) {
            if let Err(cleanup) = self.images.remove(&image.image) {
                warn!(listing_id = %id, image = %image.image, error = %cleanup, "orphaned listing image");
            }
            return Err(err);
        }

        info!(listing_id = %id, image_id = %image.id, bytes = upload.bytes.len(), "listing image stored");
        Ok(image)
    }

    pub fn remove_image(
        &self,
        principal: &Principal,
        id: ListingId,
        image_id: ImageId,
    ) -> Result<(), ListingServiceError> {
        let mut listing = self.editable(principal, id)?;
        let position = listing
            .images
            .iter()
            .position(|image| image.id == image_id)
            .ok_or(ListingServiceError::ImageNotFound {
                listing: id,
                image: image_id,
            })?;

        let image = listing.images.remove(position);
        listing.updated_at = Utc::now();
        self.persist_existing(&mut listing)?;

        if let Err(err) = self.images.remove(&image.image) {
            warn!(listing_id = %id, image = %image.image, error = %err, "orphaned listing image");
        }
        Ok(())
    }

    pub fn facilities(&self) -> &[Facility] {
        self.guard.facilities().all()
    }

    pub fn states(&self) -> &[State] {
        self.guard.locations().states()
    }

    /// Districts of a state given by id or name.
    pub fn districts(&self, state: &str) -> Result<Vec<District>, ListingServiceError> {
        let locations = self.guard.locations();
        let state = locations
            .state(state)
            .ok_or_else(|| ListingValidationError::UnknownState(state.to_string()))?;
        Ok(locations.districts_of(state))
    }

    fn fetch(&self, id: ListingId) -> Result<Listing, ListingServiceError> {
        self.repository
            .fetch(id)?
            .ok_or(ListingServiceError::NotFound(id))
    }

    fn editable(&self, principal: &Principal, id: ListingId) -> Result<Listing, ListingServiceError> {
        let listing = self.fetch(id)?;
        if !principal.can_edit(&listing) {
            warn!(listing_id = %id, principal = %principal.id, "edit refused for non-owner");
            return Err(ListingServiceError::Forbidden {
                principal: principal.id.clone(),
                listing: id,
            });
        }
        Ok(listing)
    }

    fn persist_new(&self, mut listing: Listing) -> Result<Listing, ListingServiceError> {
        self.normalizer.normalize(&mut listing.land);
        Ok(self.repository.insert(listing)?)
    }

    fn persist_existing(&self, listing: &mut Listing) -> Result<(), ListingServiceError> {
        self.normalizer.normalize(&mut listing.land);
        *listing = self.repository.update(listing.clone())?;
        Ok(())
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Images(#[from] ImageStoreError),
    #[error("listing {0} not found")]
    NotFound(ListingId),
    #[error("image {image} not found on listing {listing}")]
    ImageNotFound { listing: ListingId, image: ImageId },
    #[error("{principal} may not modify listing {listing}")]
    Forbidden {
        principal: PrincipalId,
        listing: ListingId,
    },
    #[error("unsupported image content type {0}")]
    UnsupportedImage(String),
    #[error("image upload is empty")]
    EmptyImage,
}
