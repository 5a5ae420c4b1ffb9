//! Local preview server for the generated site.
//!
//! Serves `output_dir` as static files with axum and tower-http's
//! `ServeDir`. Directory URLs resolve to their `index.html`. There is no
//! rebuild or live reload: run `mdblog build` again and refresh.

use axum::Router;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("output directory {0} does not exist; run `mdblog build` first")]
    MissingOutput(PathBuf),
    #[error("cannot listen on {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Static file router for `root`.
pub fn router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

/// Serve `root` on `host:port` until Ctrl+C.
pub fn serve(root: &Path, host: &str, port: u16) -> Result<(), ServeError> {
    if !root.is_dir() {
        return Err(ServeError::MissingOutput(root.to_path_buf()));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|source| ServeError::Bind {
                addr: format!("{host}:{port}"),
                source,
            })?;
        let addr = listener.local_addr()?;
        info!(%addr, "listening");
        println!(
            "Serving '{}' at http://localhost:{}",
            root.display(),
            addr.port()
        );
        println!("Press Ctrl+C to stop.");

        axum::serve(listener, router(root))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
