//! Street resolution server.
//!
//! Serves streets, plans and projects resolved live from the configured
//! feature services as GeoJSON-flavoured JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use streetgraph::{Config, Gateway};

mod routes;
use routes::AppState;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "streetgraph")]
#[command(about = "Street and plan resolution server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:4000")]
    listen: String,

    /// TOML file overriding the upstream service URLs
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Streetgraph Server");

    let config = match &args.config {
        Some(path) => {
            info!("Loading service configuration from {:?}", path);
            Config::load_from_file(path)?
        }
        None => Config::default(),
    };

    let state = Arc::new(AppState {
        gateway: Gateway::connect(config)?,
    });

    let app = Router::new()
        .route("/health", get(routes::health_handler))
        .route("/v1/streets", get(routes::streets_handler))
        .route("/v1/streets/{id}", get(routes::street_handler))
        .route("/v1/streets/{id}/{relation}", get(routes::street_relation_handler))
        .route("/v1/areaPlans", get(routes::area_plans_handler))
        .route("/v1/areaPlans/{id}", get(routes::area_plan_handler))
        .route("/v1/masterStreetPlans", get(routes::master_street_plans_handler))
        .route("/v1/masterStreetPlans/{id}", get(routes::master_street_plan_handler))
        .route("/v1/projects", get(routes::projects_handler))
        .route("/v1/projects/{id}", get(routes::project_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
