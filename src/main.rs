use imageingest::{config::IngestConfig, router};
use std::net::SocketAddr;

/// Standalone image ingestion server entry point.
///
/// Initializes tracing, validates configuration, and starts the HTTP
/// server handling ingest and bulk-delete requests.
///
/// # Configuration
/// Environment variables:
/// - `INGEST_UPLOAD_URL`: image-host upload endpoint (required)
/// - `INGEST_DELETE_URL`: image-host destroy endpoint
/// - `INGEST_UPLOAD_PRESET`: unsigned upload preset (default: "unsigned_products")
/// - `INGEST_ADMIN_TOKENS`: comma-separated bearer tokens granted admin
/// - `PORT`: HTTP listen port (default: 8080)
/// - `RUST_LOG`: logging verbosity (default: "imageingest=debug")
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imageingest=debug".into()),
        )
        .init();

    tracing::info!("Starting image ingestion server");

    let cfg = IngestConfig {
        upload_endpoint: std::env::var("INGEST_UPLOAD_URL").unwrap_or_default(),
        delete_endpoint: std::env::var("INGEST_DELETE_URL").unwrap_or_default(),
        upload_preset: std::env::var("INGEST_UPLOAD_PRESET")
            .unwrap_or_else(|_| "unsigned_products".into()),
        admin_tokens: std::env::var("INGEST_ADMIN_TOKENS")
            .unwrap_or_default()
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .collect(),
        ..IngestConfig::default()
    };
    cfg.validate()?;

    let app = router(cfg)?;

    // Cloud platforms inject PORT
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .unwrap_or(8080);

    // Bind to 0.0.0.0 for containerized deployment
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
