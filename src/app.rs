use crate::config::Config;
use crate::error::ApiError;
use crate::handlers;
use crate::models::{MediaRecord, Movie, Series, Song};
use crate::store::{CatalogStore, JsonFileStore};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub docs_path: Arc<PathBuf>,
    /// Held across load-mutate-save so concurrent writes cannot lose updates.
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, docs_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            docs_path: Arc::new(docs_path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// First dispatch stage: what the trimmed path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Docs,
    Movies,
    Series,
    Songs,
    NotFound,
}

impl Route {
    pub fn resolve(path: &str) -> Self {
        match path.trim_matches('/') {
            "" => Route::Docs,
            "movies" => Route::Movies,
            "series" => Route::Series,
            "songs" => Route::Songs,
            _ => Route::NotFound,
        }
    }
}

/// Seeds the catalog file if needed and serves until Ctrl+C/SIGTERM.
pub async fn run_server(config: &Config) -> Result<()> {
    let state = prepare_state(config).await?;
    let listener = bind(config.addr()).await?;
    serve(listener, state, shutdown_signal()).await
}

pub async fn prepare_state(config: &Config) -> Result<AppState> {
    let store = JsonFileStore::new(&config.data_path);
    store
        .ensure_seeded()
        .await
        .with_context(|| format!("Failed to initialise catalog at {:?}", config.data_path))?;
    info!("Using catalog file {:?}", store.path());
    Ok(AppState::new(Arc::new(store), &config.docs_path))
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))
}

pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
        info!("Visit http://localhost:{} for API documentation", addr.port());
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    match Route::resolve(uri.path()) {
        Route::Docs => serve_docs(&state).await,
        Route::Movies => dispatch_collection::<Movie>(&state, &method, &body).await,
        Route::Series => dispatch_collection::<Series>(&state, &method, &body).await,
        Route::Songs => dispatch_collection::<Song>(&state, &method, &body).await,
        Route::NotFound => {
            debug!("No route for {} {}", method, uri.path());
            ApiError::RouteNotFound.into_response()
        }
    }
}

/// Second dispatch stage: the method picks the operation.
async fn dispatch_collection<R: MediaRecord>(
    state: &AppState,
    method: &Method,
    body: &[u8],
) -> Response {
    match method.as_str().to_ascii_lowercase().as_str() {
        "get" => handlers::list::<R>(state).await.into_response(),
        "post" => handlers::create::<R>(state, body).await.into_response(),
        "put" => handlers::update::<R>(state, body).await.into_response(),
        "delete" => handlers::delete::<R>(state, body).await.into_response(),
        other => {
            warn!("Method {} not allowed on {} collection", other, R::KIND);
            ApiError::MethodNotAllowed.into_response()
        }
    }
}

async fn serve_docs(state: &AppState) -> Response {
    match tokio::fs::read(state.docs_path.as_path()).await {
        Ok(page) => ([(header::CONTENT_TYPE, "text/html")], page).into_response(),
        Err(e) => {
            warn!("Failed to read documentation page {:?}: {}", state.docs_path, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "Error loading API documentation",
            )
                .into_response()
        }
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
