use ktm_property_hub::config::ApiToken;
use ktm_property_hub::listings::{
    AuthError, Authenticator, ImageStore, ImageStoreError, Listing, ListingId, ListingRepository,
    Principal, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct ListingTable {
    last_id: u64,
    rows: BTreeMap<ListingId, Listing>,
}

/// Process-local listing storage; ids increase monotonically like a database sequence.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListingRepository {
    table: Arc<Mutex<ListingTable>>,
}

impl ListingRepository for InMemoryListingRepository {
    fn insert(&self, mut listing: Listing) -> Result<Listing, RepositoryError> {
        let mut guard = self.table.lock().expect("repository mutex poisoned");
        guard.last_id += 1;
        listing.id = ListingId(guard.last_id);
        if guard.rows.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.rows.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn update(&self, mut listing: Listing) -> Result<Listing, RepositoryError> {
        let mut guard = self.table.lock().expect("repository mutex poisoned");
        let row = guard
            .rows
            .get_mut(&listing.id)
            .ok_or(RepositoryError::NotFound)?;
        if row.revision != listing.revision {
            return Err(RepositoryError::Conflict);
        }
        listing.revision += 1;
        *row = listing.clone();
        Ok(listing)
    }

    fn fetch(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        let guard = self.table.lock().expect("repository mutex poisoned");
        Ok(guard.rows.get(&id).cloned())
    }

    fn delete(&self, id: ListingId) -> Result<(), RepositoryError> {
        let mut guard = self.table.lock().expect("repository mutex poisoned");
        guard
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn all(&self) -> Result<Vec<Listing>, RepositoryError> {
        let guard = self.table.lock().expect("repository mutex poisoned");
        Ok(guard.rows.values().cloned().collect())
    }
}

/// Keeps uploaded images in memory and hands out `<base_url>/<key>.<ext>` references.
#[derive(Clone)]
pub(crate) struct InMemoryImageStore {
    base_url: String,
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryImageStore {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: Arc::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.blobs.lock().expect("image store mutex poisoned").len()
    }
}

impl ImageStore for InMemoryImageStore {
    fn store(
        &self,
        key: &str,
        content_type: &mime::Mime,
        bytes: &[u8],
    ) -> Result<String, ImageStoreError> {
        let extension = extension_for(content_type);
        let reference = format!("{}/{}.{}", self.base_url, key, extension);
        self.blobs
            .lock()
            .expect("image store mutex poisoned")
            .insert(reference.clone(), bytes.to_vec());
        Ok(reference)
    }

    fn remove(&self, reference: &str) -> Result<(), ImageStoreError> {
        self.blobs
            .lock()
            .expect("image store mutex poisoned")
            .remove(reference)
            .map(|_| ())
            .ok_or_else(|| ImageStoreError::Missing(reference.to_string()))
    }
}

fn extension_for(content_type: &mime::Mime) -> &'static str {
    let essence = content_type.essence_str();
    match essence {
        "image/jpeg" => "jpg",
        _ => mime_guess::get_mime_extensions_str(essence)
            .and_then(|extensions| extensions.first().copied())
            .unwrap_or("bin"),
    }
}

/// Bearer tokens configured through `LISTING_API_TOKENS`.
#[derive(Default, Clone)]
pub(crate) struct StaticTokenAuthenticator {
    principals: Arc<HashMap<String, Principal>>,
}

impl StaticTokenAuthenticator {
    pub(crate) fn from_tokens(tokens: &[ApiToken]) -> Self {
        let principals = tokens
            .iter()
            .map(|entry| {
                let principal = if entry.is_staff {
                    Principal::staff(entry.principal.clone())
                } else {
                    Principal::user(entry.principal.clone())
                };
                (entry.token.clone(), principal)
            })
            .collect();
        Self {
            principals: Arc::new(principals),
        }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        self.principals
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }
}
