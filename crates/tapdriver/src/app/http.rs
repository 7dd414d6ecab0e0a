//! HTTP edge: every request under the prefix goes to the dispatcher.
//!
//! The server runs on its own thread with its own runtime so callers (the
//! `serve` command and the black-box tests) stay synchronous. Commands block
//! on the driver, so each one runs on the blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tokio::sync::watch;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::adapters::{CommandDispatcher, WireResponse};
use crate::infra::{ConfigError, ServerConfig};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Error)]
pub enum ApiServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to {operation}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("server thread exited before it started listening")]
    NotStarted,
}

impl ApiServerError {
    fn io(operation: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| ApiServerError::Io { operation, source }
    }
}

/// A running server. Dropping it shuts the server down.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    join: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Actual bound address; differs from the configured one for port 0.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops accepting, lets in-flight commands finish, then joins.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("HTTP server thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn build_app(dispatcher: Arc<CommandDispatcher>, max_request_bytes: usize) -> Router {
    Router::new()
        .fallback(handle_command)
        .with_state(dispatcher)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_request_bytes))
        .layer(TraceLayer::new_for_http())
}

async fn handle_command(
    State(dispatcher): State<Arc<CommandDispatcher>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let worker = Arc::clone(&dispatcher);
    let worker_method = method.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        worker.dispatch(worker_method.as_str(), &path, &body)
    })
    .await;

    match outcome {
        Ok(Ok(response)) => json_response(&response),
        Ok(Err(not_found)) => {
            debug!(uri = %uri, reason = %not_found, "Not a command");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            error!(uri = %uri, error = %err, "Command worker failed");
            let response = if err.is_panic() {
                dispatcher.fault(method.as_str(), uri.path(), err.into_panic().as_ref())
            } else {
                dispatcher.fault(method.as_str(), uri.path(), &"command worker was cancelled")
            };
            json_response(&response)
        }
    }
}

fn json_response(response: &WireResponse) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
        response.to_body(),
    )
        .into_response()
}

/// Binds `config.listen` and serves on a background thread.
///
/// Returns once the listener is bound, so the address is immediately usable.
pub fn spawn_server(
    config: &ServerConfig,
    dispatcher: Arc<CommandDispatcher>,
) -> Result<ServerHandle, ApiServerError> {
    let listen_addr = config.listen_addr()?;
    let app = build_app(dispatcher, config.max_request_bytes);
    let (ready_tx, ready_rx) = mpsc::channel::<Result<SocketAddr, ApiServerError>>();
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let join = thread::Builder::new()
        .name("tapdriver-http".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = ready_tx.send(Err(ApiServerError::io("build runtime")(err)));
                    return;
                }
            };

            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::bind(listen_addr).await {
                    Ok(listener) => listener,
                    Err(err) => {
                        let _ = ready_tx.send(Err(ApiServerError::io("bind listener")(err)));
                        return;
                    }
                };
                let actual = listener.local_addr().unwrap_or(listen_addr);
                let _ = ready_tx.send(Ok(actual));
                info!(listen = %actual, "Server listening");

                let served = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.changed().await;
                    })
                    .await;
                if let Err(err) = served {
                    error!(error = %err, "HTTP server failed");
                }
                info!(listen = %actual, "Server stopped");
            });
        })
        .map_err(ApiServerError::io("spawn server thread"))?;

    let addr = ready_rx
        .recv()
        .map_err(|_| ApiServerError::NotStarted)??;
    Ok(ServerHandle {
        addr,
        shutdown: shutdown_tx,
        join: Some(join),
    })
}

/// Blocks until Ctrl-C.
pub fn wait_for_interrupt() -> Result<(), ApiServerError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ApiServerError::io("build runtime"))?;
    runtime
        .block_on(tokio::signal::ctrl_c())
        .map_err(ApiServerError::io("listen for Ctrl-C"))?;
    info!("Interrupted, shutting down");
    Ok(())
}
