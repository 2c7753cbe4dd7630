use crate::cli::ServeArgs;
use crate::infra::{build_service, load_catalog, load_contacts, load_roster, ApiService, AppState};
use crate::routes::with_prospecting_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use leadflow::config::AppConfig;
use leadflow::error::AppError;
use leadflow::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
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

    let catalog = load_catalog(config.catalog_path.as_deref())?;
    let roster = load_roster(args.agents.as_deref())?;
    let contacts = load_contacts(args.contacts.as_deref())?;
    info!(
        contacts = contacts.len(),
        agents = roster.len(),
        out_of_target_reasons = catalog.out_of_target_reasons.len(),
        "contact base loaded"
    );

    let service = Arc::new(build_service(
        contacts,
        roster,
        catalog,
        config.dispatch.dispatch_config(),
    ));
    spawn_lease_sweeper(service.clone(), config.dispatch.sweep_interval());

    let app = with_prospecting_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        lease_ttl_secs = config.dispatch.lease_ttl_secs,
        "lead engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Clears expired leases on a fixed cadence so abandoned sessions return to the queue.
fn spawn_lease_sweeper(service: Arc<ApiService>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = service.expire_leases(Utc::now()) {
                warn!(error = %err, "lease sweep failed");
            }
        }
    });
}
