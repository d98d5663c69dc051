//! api-server: Local development HTTP server for the party planner GraphQL API.
//!
//! Serves:
//! - `POST /graphql`: execute a GraphQL request.
//! - `GET /graphql`: GraphiQL explorer.
//! - `GET /health`: liveness probe.
//!
//! Storage is in-memory by default, or DynamoDB with the `dynamo` feature and
//! `STORAGE_PROVIDER=dynamo`.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # against DynamoDB Local
//! STORAGE_PROVIDER=dynamo DYNAMO_ENDPOINT=http://localhost:8000 \
//!   cargo run -p api-server --features dynamo
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use domain::adapters::memory_store::MemoryStore;
use domain::{CoreError, Fixtures, PartyService, Store, Tables};
use graphql_schema::{build_schema, PartySchema};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);

    let fixtures = match load_fixtures(&cfg) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "failed to load fixtures");
            std::process::exit(1);
        }
    };
    let tables = Tables::from_lookup(|k| std::env::var(k).ok());
    info!(parents = %tables.parents, parties = %tables.parties, children = %tables.children, "tables");

    let store = build_store(&cfg).await;
    let schema = build_schema(PartyService::new(store, tables, fixtures));

    let app = router(schema).layer(cors_layer(&cfg));

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, storage = ?cfg.storage_provider, "api-server listening");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

fn load_fixtures(cfg: &config::Config) -> Result<Fixtures, CoreError> {
    let Some(path) = &cfg.fixtures_path else {
        return Ok(Fixtures::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CoreError::InvalidFixtures(format!("{}: {e}", path.display())))?;
    let fixtures = Fixtures::from_json(&raw)?;
    info!(path = %path.display(), viewer_id = %fixtures.viewer_id, widgets = fixtures.widgets.len(), "fixtures loaded");
    Ok(fixtures)
}

// Construct a store instance based on config and feature flags.
async fn build_store(cfg: &config::Config) -> Arc<dyn Store> {
    match cfg.storage_provider {
        #[cfg(feature = "dynamo")]
        config::StorageProvider::Dynamo => {
            let settings = aws_dynamo::DynamoSettings::from_env();
            info!(region = %settings.region, endpoint = ?settings.endpoint, "using DynamoDB store");
            Arc::new(aws_dynamo::DynamoStore::new(&settings).await)
        }
        _ => {
            info!("using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    }
}

fn cors_layer(cfg: &config::Config) -> CorsLayer {
    if cfg.cors_is_wildcard() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    }
}

fn router(schema: PartySchema) -> Router {
    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .with_state(schema)
}

async fn graphql_handler(State(schema): State<PartySchema>, req: GraphQLRequest) -> GraphQLResponse {
    let res = schema.execute(req.into_inner()).await;
    if !res.errors.is_empty() {
        info!(errors = res.errors.len(), "graphql request finished with errors");
    }
    res.into()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(http_common::json_err("not_found")))
}
