use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryImageStore, InMemoryListingRepository, StaticTokenAuthenticator};
use crate::routes::with_listing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ktm_property_hub::config::AppConfig;
use ktm_property_hub::error::AppError;
use ktm_property_hub::listings::{ListingPolicy, ListingService};
use ktm_property_hub::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    if config.auth.tokens.is_empty() {
        warn!("LISTING_API_TOKENS is empty; write endpoints will reject every request");
    }

    let repository = Arc::new(InMemoryListingRepository::default());
    let images = Arc::new(InMemoryImageStore::new(config.listings.media_base_url.clone()));
    let authenticator = Arc::new(StaticTokenAuthenticator::from_tokens(&config.auth.tokens));
    let policy = ListingPolicy {
        strict_area_units: config.listings.strict_area_units,
    };
    let listing_service = Arc::new(ListingService::new(repository, images, policy));

    let app = with_listing_routes(listing_service, authenticator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        strict_area_units = config.listings.strict_area_units,
        "property listing service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
