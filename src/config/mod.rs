//! Application configuration

pub mod templates;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::extract::BlockScheme;

pub use templates::TemplateSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub azure_openai_endpoint: String,
    pub azure_openai_key: String,
    pub azure_openai_version: String,
    pub azure_openai_deployment: String,

    pub azure_search_endpoint: Option<String>,
    pub azure_search_index: Option<String>,

    /// Substituted for the key placeholder in generated documents.
    pub maps_subscription_key: String,

    /// Which reply format the model is instructed to use and the
    /// extractor parses.
    pub block_scheme: BlockScheme,

    /// Base URL that attached-file placeholders resolve against.
    pub file_base_url: String,

    /// Directory served at `/data` (uploaded/sample data files).
    pub data_dir: PathBuf,
    /// Directory served at `/static` and as the root fallback.
    pub static_dir: PathBuf,
    /// Generated map documents, one per successful code-producing turn.
    pub output_dir: PathBuf,
    /// Conversation snapshots, one JSON file per conversation.
    pub history_dir: PathBuf,
    /// Optional TOML file overriding the built-in prompt/skeleton set.
    pub templates_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let file_base_url = env::var("FILE_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}/data/data_sample"));

        let block_scheme = match env::var("BLOCK_SCHEME") {
            Ok(value) => value
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
            Err(_) => BlockScheme::TagDelimited,
        };

        Ok(Self {
            host,
            port,
            azure_openai_endpoint: env::var("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
            azure_openai_key: env::var("AZURE_OPENAI_KEY").unwrap_or_default(),
            azure_openai_version: env::var("AZURE_OPENAI_VERSION")
                .unwrap_or_else(|_| "2024-08-01-preview".into()),
            azure_openai_deployment: env::var("AZURE_OPENAI_DEPLOYMENT")
                .unwrap_or_else(|_| "gpt-4".into()),
            azure_search_endpoint: env::var("AZURE_AI_SEARCH_ENDPOINT").ok(),
            azure_search_index: env::var("AZURE_AI_SEARCH_INDEX").ok(),
            maps_subscription_key: env::var("AZURE_MAPS_SUB_KEY").unwrap_or_default(),
            block_scheme,
            file_base_url,
            data_dir: env_path("DATA_DIR", "./data"),
            static_dir: env_path("STATIC_DIR", "./static"),
            output_dir: env_path("OUTPUT_DIR", "./generated_maps"),
            history_dir: env_path("HISTORY_DIR", "./chat_histories"),
            templates_path: env::var("TEMPLATES_FILE").ok().map(PathBuf::from),
        })
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}
