use crate::cli::ServeArgs;
use crate::infra::{seed_demo, ApiService, AppState, Platform};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use internhub::config::AppConfig;
use internhub::error::AppError;
use internhub::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
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

    let platform = Platform::in_memory(config.notifications.retention);
    if config.seed_demo {
        seed_demo(&platform)?;
        info!("demo accounts seeded");
    }

    let reconciler = config
        .reconciliation
        .interval()
        .map(|every| spawn_reconciliation(platform.service.clone(), every));

    let app = with_platform_routes(&platform)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "internship marketplace ready");

    let served = axum::serve(listener, app).await;
    if let Some(reconciler) = reconciler {
        reconciler.abort();
    }
    served?;
    Ok(())
}

/// Periodically converge the student-side mirrors with the postings.
pub(crate) fn spawn_reconciliation(service: Arc<ApiService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick fires immediately; nothing can be stale yet
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(err) = service.reconcile() {
                warn!(error = %err, "mirror reconciliation failed");
            }
        }
    })
}
