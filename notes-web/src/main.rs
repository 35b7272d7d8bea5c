mod app;
mod auth;
mod db;
mod notes;
mod shared;
mod users;

pub use app::{
    config, create_app, ctx,
    errors::{self, Error, Result},
    state,
};
pub use shared::views;

use db::init_db;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> errors::Result<()> {
    let config = config::config();

    shared::tracing::setup_tracing(config.log_json);

    let conn = init_db().await?;

    let app = create_app(conn).await?;

    let app = shared::tracing::add_tracing_layer(app);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Unexpected(format!("failed to bind {addr}: {e}")))?;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("listening on http://{addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Unexpected(e.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
