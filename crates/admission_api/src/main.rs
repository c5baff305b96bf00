use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use admission_api::router;
use admission_db::{apply_schema, connect, FormRepository};
use admission_service::adapters::{RazorpayClient, S3BlobStore};
use admission_service::{AdmissionService, Config, ServiceSettings};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_json);

    let pool = connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    apply_schema(&pool).await.context("Failed to apply schema")?;

    let blobs = S3BlobStore::from_settings(&config.s3).await;
    if let Err(e) = blobs.ensure_bucket().await {
        warn!(bucket = %config.s3.bucket, error = %e, "bucket check failed; uploads may fail");
    }
    let payments = RazorpayClient::new(&config.razorpay).context("Failed to build payment client")?;

    let service = AdmissionService::new(
        Arc::new(FormRepository::new(pool)),
        Arc::new(blobs),
        Arc::new(payments),
        ServiceSettings::from_config(&config),
    );
    let app = router(Arc::new(service), config.max_body_bytes);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
