use crate::cli::ServeArgs;
use crate::infra::{
    seeded_officiants, AppState, DirectoryGeocoder, InMemoryRegistryStore, LoggingPublisher,
};
use crate::routes::with_registry_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kua_registry::config::AppConfig;
use kua_registry::error::AppError;
use kua_registry::telemetry;
use kua_registry::workflows::marriage::{
    CachedGeocoder, Clock, GeocodeQueue, MarriageWorkflow, NotificationOutbox, ReminderScanner,
    SystemClock,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(InMemoryRegistryStore::with_officiants(seeded_officiants()));

    let (outbox, notification_worker) = NotificationOutbox::channel(Arc::new(LoggingPublisher));
    let outbox = Arc::new(outbox);
    tokio::spawn(async move {
        let delivered = notification_worker.run().await;
        info!(delivered, "notification worker stopped");
    });

    let geocoder = CachedGeocoder::new(
        DirectoryGeocoder::banjarmasin(),
        config.geocoding.cache_ttl,
        clock.clone(),
    );
    let (geocode_queue, geocode_worker) =
        GeocodeQueue::channel(Arc::new(geocoder), store.clone(), config.geocoding.timeout);
    tokio::spawn(async move {
        let resolved = geocode_worker.run().await;
        info!(resolved, "geocoding worker stopped");
    });

    let workflow = Arc::new(
        MarriageWorkflow::with_clock(
            store.clone(),
            outbox.clone(),
            config.scheduling,
            clock.clone(),
        )
        .with_geocoding(geocode_queue),
    );

    let scanner = Arc::new(ReminderScanner::new(store, outbox, clock.clone()));
    tokio::spawn(scanner.run_daily(config.reminders.run_at));

    let app = with_registry_routes(workflow)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "kua registry service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
