use mime::Mime;

use super::domain::{Listing, ListingId};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Callers hand over listings whose land fields are already normalized; the
/// repository only stores what it is given.
pub trait ListingRepository: Send + Sync {
    /// Stores a new listing, assigning its id. `listing.id` is ignored.
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    /// Replaces a stored listing. Implementations must reject the write with
    /// [`RepositoryError::Conflict`] when the stored `revision` differs from
    /// `listing.revision`, and return the row as stored with the revision
    /// incremented.
    fn update(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    fn fetch(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError>;
    fn delete(&self, id: ListingId) -> Result<(), RepositoryError>;
    fn all(&self) -> Result<Vec<Listing>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Blob storage for listing images: store bytes, get back a reference.
pub trait ImageStore: Send + Sync {
    /// `key` is a suggested object name without extension.
    fn store(&self, key: &str, content_type: &Mime, bytes: &[u8])
        -> Result<String, ImageStoreError>;
    fn remove(&self, reference: &str) -> Result<(), ImageStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("image reference not found: {0}")]
    Missing(String),
    #[error("image storage unavailable: {0}")]
    Transport(String),
}
