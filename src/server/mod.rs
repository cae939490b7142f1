use crate::catalog::InMemoryVideoRepository;
use crate::config::Config;
use crate::detector::FfprobeDetector;
use crate::reader::FileReader;
use crate::streamer::{Communicator, ResourceStreamer, StrategyDeps};
use crate::tokenizer::JwtTokenizer;
use anyhow::{Context, Result};
use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub streamer: Arc<ResourceStreamer>,
    /// Cancelled when the server shuts down; stops every running stream.
    pub shutdown: CancellationToken,
}

impl AppContext {
    pub fn new(config: Config, streamer: ResourceStreamer, shutdown: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            streamer: Arc::new(streamer),
            shutdown,
        }
    }
}

/// Wire the streaming engine from configuration.
pub fn build_context(config: Config, shutdown: CancellationToken) -> Result<AppContext> {
    let videos = InMemoryVideoRepository::from_entries(&config.videos)
        .context("Failed to build video catalog")?;
    tracing::info!("Catalog holds {} videos", videos.len());

    let deps = StrategyDeps {
        videos: Arc::new(videos),
        detector: Arc::new(FfprobeDetector::from_config(&config.tools)),
        reader: FileReader::new(config.reader.chunk_size, shutdown.clone()),
        communicator: Communicator::new(),
    };
    let tokenizer = Arc::new(JwtTokenizer::from_config(&config.auth));
    let streamer = ResourceStreamer::with_default_strategies(deps, tokenizer);

    Ok(AppContext::new(config, streamer, shutdown))
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let ws_path = ctx.config.server.ws_path.clone();

    Router::new()
        .route("/health", get(health_check))
        .route(&ws_path, get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(ctx): State<AppContext>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move { ctx.streamer.stream(socket, peer).await })
}

/// Serve `ctx` on an already bound listener until `signal` resolves.
///
/// Running streams are cancelled through the context's shutdown token as
/// soon as the signal fires.
pub async fn serve<F>(listener: TcpListener, ctx: AppContext, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let shutdown = ctx.shutdown.clone();
    let app = create_router(ctx);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        signal.await;
        shutdown.cancel();
    })
    .await?;

    Ok(())
}

/// Start the WebSocket server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let ws_path = config.server.ws_path.clone();

    let ctx = build_context(config, CancellationToken::new())?;

    tracing::info!("Starting server on {} (WebSocket at {})", addr, ws_path);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    serve(listener, ctx, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
