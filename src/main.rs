//! geoviz-ai service entry point
//!
//! Wires the chat engine to the Azure OpenAI provider and exposes the
//! HTTP API plus static/data file serving.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoviz_ai::config::{Config, TemplateSet};
use geoviz_ai::conversation::FileStore;
use geoviz_ai::core::ChatEngine;
use geoviz_ai::providers::{AzureOpenAIConfig, AzureOpenAIProvider};
use geoviz_ai::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoviz_ai=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    for dir in [&config.data_dir, &config.static_dir, &config.output_dir] {
        std::fs::create_dir_all(dir)?;
    }

    let templates = match &config.templates_path {
        Some(path) => TemplateSet::load_from_file(path).await?,
        None => TemplateSet::default(),
    };

    let store = Arc::new(FileStore::new(config.history_dir.clone())?);
    let provider = Arc::new(AzureOpenAIProvider::new(AzureOpenAIConfig {
        endpoint: config.azure_openai_endpoint.clone(),
        api_key: config.azure_openai_key.clone(),
        api_version: config.azure_openai_version.clone(),
        deployment: config.azure_openai_deployment.clone(),
        ..Default::default()
    })?);

    let engine = Arc::new(ChatEngine::new(
        config.clone(),
        templates,
        store,
        provider,
    ));

    let state = AppState {
        config: config.clone(),
        engine,
    };

    let app = Router::new()
        .merge(routes::router())
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .nest_service("/data", ServeDir::new(&config.data_dir))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("geoviz API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
