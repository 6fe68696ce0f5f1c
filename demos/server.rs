use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use elasticsearch_exporter::{Exporter, ExporterConfig};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Serves Elasticsearch index metrics on `/metrics`.
#[derive(Debug, Parser)]
struct Args {
    /// Address to listen on.
    #[arg(long = "web.listen-address", env = "WEB_LISTEN_ADDRESS", default_value = "0.0.0.0:9114")]
    listen_address: SocketAddr,

    /// Base URL of the Elasticsearch HTTP API.
    #[arg(long = "es.uri", env = "ES_URI", default_value = "http://localhost:9200")]
    uri: Url,

    /// Comma separated indices to report on. Reports on all when empty.
    #[arg(long = "es.indices", env = "ES_INDICES", value_delimiter = ',')]
    indices: Vec<String>,

    /// Request timeout in seconds.
    #[arg(long = "es.timeout", env = "ES_TIMEOUT", default_value_t = 5)]
    timeout_secs: u64,

    /// Seconds between cluster info retrievals.
    #[arg(long = "es.clusterinfo.interval", env = "ES_CLUSTERINFO_INTERVAL", default_value_t = 300)]
    cluster_info_interval_secs: u64,
}

impl From<Args> for ExporterConfig {
    fn from(args: Args) -> Self {
        ExporterConfig {
            uri: args.uri,
            indices: args.indices,
            timeout_secs: args.timeout_secs,
            cluster_info_interval_secs: args.cluster_info_interval_secs,
            ..Default::default()
        }
    }
}

async fn metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    // Collectors block on HTTP, keep them off the async workers.
    let encoded = tokio::task::spawn_blocking(move || {
        let mut buffer = String::new();
        encode(&mut buffer, &registry).map(|_| buffer)
    })
    .await;

    match encoded {
        Ok(Ok(buffer)) => Response::builder()
            .status(StatusCode::OK)
            .header(
                CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )
            .body(Body::from(buffer))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR),
        Ok(Err(err)) => {
            error!(error = %err, "failed to encode metrics");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(err) => {
            error!(error = %err, "metrics encoding task failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn serve(
    listen_address: SocketAddr,
    registry: Arc<Registry>,
    tasks: elasticsearch_exporter::BackgroundTasks,
) -> std::io::Result<()> {
    let shutdown = CancellationToken::new();
    let background = tokio::spawn(tasks.run(shutdown.clone()));

    let router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);
    let listener = tokio::net::TcpListener::bind(listen_address).await?;
    info!(%listen_address, "serving metrics");

    let signal = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Err(err) = background.await {
        error!(error = %err, "background tasks failed");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let listen_address = args.listen_address;
    let config = ExporterConfig::from(args);

    // The blocking clients inside the collectors have to be created and
    // dropped outside the runtime.
    let mut registry = Registry::default();
    let tasks = Exporter::new(&config)?.register(&mut registry);
    let registry = Arc::new(registry);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(listen_address, registry.clone(), tasks))?;

    drop(registry);
    Ok(())
}
