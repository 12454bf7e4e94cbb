use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use ktm_property_hub::listings::{
    listing_router, Authenticator, ImageStore, ListingRepository, ListingService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_listing_routes<R, S, A>(
    service: Arc<ListingService<R, S>>,
    auth: Arc<A>,
) -> axum::Router
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    A: Authenticator + 'static,
{
    listing_router(service, auth)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryImageStore, InMemoryListingRepository, StaticTokenAuthenticator};
    use axum::body::Body;
    use axum::http::Request;
    use ktm_property_hub::config::ApiToken;
    use ktm_property_hub::listings::ListingPolicy;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let service = Arc::new(ListingService::new(
            Arc::new(InMemoryListingRepository::default()),
            Arc::new(InMemoryImageStore::new("memory://test")),
            ListingPolicy::default(),
        ));
        let auth = Arc::new(StaticTokenAuthenticator::from_tokens(&[ApiToken {
            token: "sita-token".to_string(),
            principal: "sita".to_string(),
            is_staff: false,
        }]));
        with_listing_routes(service, auth)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn create_then_search_by_area() {
        let app = app();
        let payload = json!({
            "listing_purpose": "SELL",
            "property_type": "LAND",
            "title": "4 aana plot in Budhanilkantha",
            "state": "Bagmati",
            "district": "Kathmandu",
            "aana": 4,
            "price": 6500000
        });

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/properties")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer sita-token")
                    .body(Body::from(payload.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["total_area_sqft"], json!(1369.0));
        assert_eq!(created["owner"], json!("sita"));

        let response = app
            .oneshot(
                Request::get("/api/properties?min_area_sqft=1000&listing_purpose=SELL")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let page = json_body(response).await;
        assert_eq!(page["count"], json!(1));
    }

    #[tokio::test]
    async fn anonymous_create_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::post("/api/properties")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "listing_purpose": "RENT",
                            "property_type": "APARTMENT",
                            "title": "2BHK flat"
                        })
                        .to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
