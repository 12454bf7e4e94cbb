//! Property listings: land-area normalization, submission validation, the
//! state/district taxonomy, storage seams and the HTTP router.

pub mod area;
pub mod auth;
pub mod domain;
pub mod repository;
pub mod router;
pub mod search;
pub mod service;
pub mod taxonomy;
pub mod validation;

pub use area::{AreaNormalizer, AreaSpec, HillyArea, LandMeasurement, TeraiArea, UnitSystem};
pub use auth::{AuthError, Authenticator};
pub use domain::{
    Facility, FacilityId, ImageId, LandUnitsInput, Listing, ListingDetails, ListingId,
    ListingPurpose, ListingSubmission, Principal, PrincipalId, PropertyImage, PropertyType,
};
pub use repository::{ImageStore, ImageStoreError, ListingRepository, RepositoryError};
pub use router::listing_router;
pub use search::{ListingOrdering, ListingPage, ListingQuery};
pub use service::{ImageUpload, ListingService, ListingServiceError};
pub use taxonomy::{District, FacilityCatalog, LocationDirectory, State};
pub use validation::{ListingGuard, ListingPolicy, ListingValidationError};
