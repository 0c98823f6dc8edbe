use std::env;

use anyhow::Result;
use resq_api::build_default_app;
use resq_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("resq_api");

    let bind = env::var("RESQ_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_default_app().await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "resq triage api started");

    axum::serve(listener, app).await?;
    Ok(())
}
