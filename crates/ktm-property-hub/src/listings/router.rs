use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::auth::{optional_principal, require_principal, AuthError, Authenticator};
use super::domain::{ImageId, ListingId, ListingSubmission};
use super::repository::{ImageStore, ListingRepository, RepositoryError};
use super::search::ListingQuery;
use super::service::{ImageUpload, ListingService, ListingServiceError};

/// Shared router state: the service plus the authentication collaborator.
pub struct ListingApi<R, S, A> {
    pub service: Arc<ListingService<R, S>>,
    pub auth: Arc<A>,
}

impl<R, S, A> Clone for ListingApi<R, S, A> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// Router builder exposing the listing, image and catalog endpoints.
pub fn listing_router<R, S, A>(service: Arc<ListingService<R, S>>, auth: Arc<A>) -> Router
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    Router::new()
        .route(
            "/api/properties",
            get(list_handler::<R, S, A>).post(create_handler::<R, S, A>),
        )
        .route(
            "/api/properties/:listing_id",
            get(detail_handler::<R, S, A>)
                .put(update_handler::<R, S, A>)
                .delete(delete_handler::<R, S, A>),
        )
        .route(
            "/api/properties/:listing_id/images",
            post(upload_image_handler::<R, S, A>),
        )
        .route(
            "/api/properties/:listing_id/images/:image_id",
            delete(remove_image_handler::<R, S, A>),
        )
        .route("/api/facilities", get(facilities_handler::<R, S, A>))
        .route("/api/states", get(states_handler::<R, S, A>))
        .route("/api/districts", get(districts_handler::<R, S, A>))
        .with_state(ListingApi { service, auth })
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageUploadParams {
    pub(crate) caption: Option<String>,
    #[serde(default)]
    pub(crate) is_thumbnail: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DistrictParams {
    pub(crate) state: String,
}

pub(crate) async fn list_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    Query(query): Query<ListingQuery>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    match api.service.search(&query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn detail_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    Path(listing_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    let viewer = match optional_principal(api.auth.as_ref(), &headers) {
        Ok(viewer) => viewer,
        Err(err) => return auth_error(err),
    };
    match api.service.get(viewer.as_ref(), ListingId(listing_id)) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn create_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    headers: HeaderMap,
    Json(submission): Json<ListingSubmission>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    let principal = match require_principal(api.auth.as_ref(), &headers) {
        Ok(principal) => principal,
        Err(err) => return auth_error(err),
    };
    match api.service.create(&principal, submission) {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn update_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    Path(listing_id): Path<u64>,
    headers: HeaderMap,
    Json(submission): Json<ListingSubmission>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    let principal = match require_principal(api.auth.as_ref(), &headers) {
        Ok(principal) => principal,
        Err(err) => return auth_error(err),
    };
    match api
        .service
        .update(&principal, ListingId(listing_id), submission)
    {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn delete_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    Path(listing_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    let principal = match require_principal(api.auth.as_ref(), &headers) {
        Ok(principal) => principal,
        Err(err) => return auth_error(err),
    };
    match api.service.delete(&principal, ListingId(listing_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn upload_image_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    Path(listing_id): Path<u64>,
    Query(params): Query<ImageUploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    let principal = match require_principal(api.auth.as_ref(), &headers) {
        Ok(principal) => principal,
        Err(err) => return auth_error(err),
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok());
    let Some(content_type) = content_type else {
        let payload = json!({ "error": "image uploads need an image/* Content-Type" });
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(payload)).into_response();
    };

    let upload = ImageUpload {
        content_type,
        bytes: body.to_vec(),
        caption: params.caption,
        is_thumbnail: params.is_thumbnail,
    };
    match api
        .service
        .attach_image(&principal, ListingId(listing_id), upload)
    {
        Ok(image) => (StatusCode::CREATED, Json(image)).into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn remove_image_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    Path((listing_id, image_id)): Path<(u64, u64)>,
    headers: HeaderMap,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    let principal = match require_principal(api.auth.as_ref(), &headers) {
        Ok(principal) => principal,
        Err(err) => return auth_error(err),
    };
    match api
        .service
        .remove_image(&principal, ListingId(listing_id), ImageId(image_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn facilities_handler<R, S, A>(State(api): State<ListingApi<R, S, A>>) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    (StatusCode::OK, Json(api.service.facilities())).into_response()
}

pub(crate) async fn states_handler<R, S, A>(State(api): State<ListingApi<R, S, A>>) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    (StatusCode::OK, Json(api.service.states())).into_response()
}

pub(crate) async fn districts_handler<R, S, A>(
    State(api): State<ListingApi<R, S, A>>,
    Query(params): Query<DistrictParams>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    match api.service.districts(&params.state) {
        Ok(districts) => (StatusCode::OK, Json(districts)).into_response(),
        Err(err) => service_error(err),
    }
}

fn auth_error(error: AuthError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(payload),
    )
        .into_response()
}

pub(crate) fn service_error(error: ListingServiceError) -> Response {
    match error {
        ListingServiceError::Validation(error) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        ListingServiceError::NotFound(_)
        | ListingServiceError::ImageNotFound { .. }
        | ListingServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        ListingServiceError::Forbidden { .. } => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        ListingServiceError::UnsupportedImage(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(payload)).into_response()
        }
        ListingServiceError::EmptyImage => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        ListingServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
