use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use heic_convert_backend::config::AppConfig;
use heic_convert_backend::services::converter::FfmpegConverter;
use heic_convert_backend::services::storage::StorageService;
use heic_convert_backend::services::worker::RetentionSweeper;
use heic_convert_backend::{AppState, create_app};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heic_convert_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting HEIC Convert Backend...");

    let config = AppConfig::from_env();
    info!(
        "⚙️  Config: Mode={}, Max Size={}MB, Max Files={}, Retention={:?}",
        config.mode.as_str(),
        config.max_file_size / 1024 / 1024,
        config.max_files_per_request,
        config.retention_max_age,
    );

    // Staging and output directories must exist before any request is served
    let storage = Arc::new(StorageService::new(&config));
    storage.ensure_directories().await?;
    info!(
        "📁 Storage ready: {} | {}",
        storage.uploads_dir().display(),
        storage.converted_dir().display()
    );

    let state = AppState {
        config: config.clone(),
        storage: storage.clone(),
        converter: Arc::new(FfmpegConverter::default()),
    };

    // Setup Shutdown Channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Start Retention Sweeper
    let sweeper = RetentionSweeper::new(
        storage.clone(),
        config.retention_max_age,
        config.sweep_interval,
        shutdown_rx,
    );
    tokio::spawn(async move {
        sweeper.run().await;
    });

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("✅ Server ready at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
