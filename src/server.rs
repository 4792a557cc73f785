use std::{future::Future, net::SocketAddr, sync::Arc, thread};

use axum::{routing::get, Router};
use tokio::{net::TcpListener, sync::oneshot};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{event, Level};

use crate::{error::SuiteError, routes::*, state::AppState};

const ROUTE_PREFIXES: [&str; 2] = ["/api/products", "/api/Products"];

/// Builds the stub Products API. Routing is case sensitive, so every route is
/// mounted under both spellings the suite uses.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new();

    for prefix in ROUTE_PREFIXES {
        router = router
            .route(prefix, get(get_all_products).post(create_product))
            .route(
                &format!("{}/{{id}}", prefix),
                get(get_product)
                    .put(put_product)
                    .delete(delete_product)
                    .patch(patch_product),
            );
    }

    router.with_state(Arc::new(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves once `signal` fires. If the signal cannot be listened for, the
/// error is logged and the future never resolves, so the server keeps going.
pub async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        event!(Level::ERROR, "Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// The stub running on its own thread and runtime, so blocking clients can
/// talk to it from plain test threads. Dropping the handle stops the server.
pub struct StubServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    pub fn start(bind_addr: &str, state: AppState) -> Result<StubServer, SuiteError> {
        let listener = std::net::TcpListener::bind(bind_addr)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = thread::Builder::new()
            .name(String::from("products-stub"))
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(e) => {
                            event!(Level::ERROR, "Stub listener could not be registered: {}", e);
                            return;
                        }
                    };

                    let shutdown = async move {
                        let _ = shutdown_rx.await;
                    };

                    if let Err(e) = serve(listener, state, shutdown).await {
                        event!(Level::ERROR, "Stub Products API stopped: {}", e);
                    }
                });
            })?;

        event!(Level::INFO, "Stub Products API listening on {}", addr);

        Ok(StubServer {
            addr,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
