//! Notegraph
//!
//! A concept graph over short notes:
//! - concept extraction through an OpenAI-compatible chat API
//! - notes and their concepts kept in a SQLite store
//! - a weighted similarity graph (nodes, edges, shared-concept vertices)
//! - a line-oriented text file as the graph's durable form

pub mod concepts;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod store;

pub use error::GraphError;

use anyhow::{Context, Result};
use graph::ScoringStrategy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub graph: GraphYamlConfig,
    pub store: StoreYamlConfig,
    pub extractor: ExtractorConfig,
}

/// Graph file and scoring section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphYamlConfig {
    pub path: String,
    pub scoring: ScoringStrategy,
}

impl Default for GraphYamlConfig {
    fn default() -> Self {
        Self {
            path: "knowledge_graph.txt".into(),
            scoring: ScoringStrategy::Jaccard,
        }
    }
}

/// Note store section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreYamlConfig {
    pub path: String,
}

impl Default for StoreYamlConfig {
    fn default() -> Self {
        Self {
            path: "notes.db".into(),
        }
    }
}

/// Concept extractor section (chat-completions endpoint)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Store a model summary as node text instead of the raw note
    pub summarize: bool,
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-3.5-turbo".into(),
            api_key: None,
            summarize: false,
            timeout_secs: 30,
        }
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub graph_path: PathBuf,
    pub scoring: ScoringStrategy,
    pub store_path: PathBuf,
    pub extractor: ExtractorConfig,
}

impl Default for Config {
    fn default() -> Self {
        let yaml = YamlConfig::default();
        Self {
            graph_path: yaml.graph.path.into(),
            scoring: yaml.graph.scoring,
            store_path: yaml.store.path.into(),
            extractor: yaml.extractor,
        }
    }
}

impl Config {
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "notegraph.yaml" in CWD. A missing file
    /// falls back to env vars / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let scoring = match std::env::var("NOTEGRAPH_SCORING") {
            Ok(raw) => raw
                .parse::<ScoringStrategy>()
                .map_err(anyhow::Error::msg)
                .context("Invalid NOTEGRAPH_SCORING")?,
            Err(_) => yaml.graph.scoring,
        };

        let api_key = std::env::var("OPENAI_API_KEY")
            .or_else(|_| std::env::var("MY_SECRET"))
            .ok()
            .filter(|k| !k.is_empty())
            .or(yaml.extractor.api_key);

        Ok(Self {
            graph_path: std::env::var("NOTEGRAPH_GRAPH_PATH")
                .unwrap_or(yaml.graph.path)
                .into(),
            scoring,
            store_path: std::env::var("NOTEGRAPH_STORE_PATH")
                .unwrap_or(yaml.store.path)
                .into(),
            extractor: ExtractorConfig {
                url: std::env::var("CONCEPTS_URL").unwrap_or(yaml.extractor.url),
                model: std::env::var("CONCEPTS_MODEL").unwrap_or(yaml.extractor.model),
                api_key,
                summarize: std::env::var("NOTEGRAPH_SUMMARIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(yaml.extractor.summarize),
                timeout_secs: yaml.extractor.timeout_secs,
            },
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("notegraph.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}
