//! JSON REST surface over [`StorageHandle`].
//!
//! Every handler hops onto the blocking pool, opens its own SQLite
//! connection and maps [`StorageError`](crate::storage::StorageError) into
//! an HTTP status with an `{"error": ...}` body.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::storage::{StorageHandle, StorageResult};

mod error;
mod folders;
mod notes;

pub use error::ApiError;

#[derive(Clone)]
pub struct ApiState {
    storage: StorageHandle,
}

pub fn router(storage: StorageHandle) -> Router {
    let routes = Router::new()
        .route("/folders", get(folders::list).post(folders::create))
        .route(
            "/folders/:id",
            get(folders::show)
                .put(folders::update)
                .delete(folders::destroy),
        )
        .route("/notes", get(notes::list).post(notes::create))
        .route(
            "/notes/:id",
            get(notes::show).put(notes::update).delete(notes::destroy),
        );

    Router::new()
        .nest("/api", routes.clone())
        .merge(routes)
        .layer(TraceLayer::new_for_http())
        .with_state(ApiState { storage })
}

pub async fn serve(storage: StorageHandle, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let local_addr = listener.local_addr().context("reading bound address")?;
    tracing::info!(addr = %local_addr, db = %storage.database_path().display(), "serving folders and notes");
    axum::serve(listener, router(storage))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running http server")?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn with_storage<F, T>(state: &ApiState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&StorageHandle) -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let storage = state.storage.clone();
    let result = tokio::task::spawn_blocking(move || f(&storage))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "storage task panicked");
            ApiError::Internal(format!("storage task failed: {err}"))
        })?;
    Ok(result?)
}
