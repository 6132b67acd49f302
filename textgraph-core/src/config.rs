//! Configuration for the attention pipeline.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides. Files are read
//! from `~/.config/textgraph/config.toml` and `.textgraph/config.toml` in the
//! workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::GatError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatConfig {
    /// Options shared by both attention variants.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Dot-product GAT without self-attention.
    #[serde(default)]
    pub educational: EducationalConfig,
    /// Concatenated-feature GAT with self-attention.
    #[serde(default)]
    pub original: OriginalConfig,
    /// Real embedding backend.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Pipeline-wide options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Round every normalized cell to one decimal place.
    #[serde(default)]
    pub round_to_one_decimal: bool,
    /// Number of paragraph tokens kept in a result.
    #[serde(default = "default_paragraph_limit")]
    pub paragraph_display_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            round_to_one_decimal: false,
            paragraph_display_limit: default_paragraph_limit(),
        }
    }
}

fn default_paragraph_limit() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationalConfig {
    #[serde(default = "default_embedding_dims")]
    pub dimensions: usize,
    #[serde(default = "default_educational_slope")]
    pub leaky_slope: f64,
    /// Added to the raw score of immediately adjacent tokens.
    #[serde(default = "default_adjacency_bonus")]
    pub adjacency_bonus: f64,
    /// Added to every embedding dimension when the token occurs in the paragraph.
    #[serde(default = "default_context_bonus")]
    pub context_bonus: f64,
}

impl Default for EducationalConfig {
    fn default() -> Self {
        Self {
            dimensions: default_embedding_dims(),
            leaky_slope: default_educational_slope(),
            adjacency_bonus: default_adjacency_bonus(),
            context_bonus: default_context_bonus(),
        }
    }
}

fn default_embedding_dims() -> usize {
    64
}

fn default_educational_slope() -> f64 {
    0.1
}

fn default_adjacency_bonus() -> f64 {
    0.3
}

fn default_context_bonus() -> f64 {
    0.2
}

/// How the simulated learnable weights of the original variant are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightSeed {
    /// Reproducible weights.
    Fixed(u64),
    /// Fresh OS-seeded weights on every computation.
    Entropy,
}

impl Default for WeightSeed {
    fn default() -> Self {
        Self::Fixed(42)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalConfig {
    /// Node feature dimension before the linear transform.
    #[serde(default = "default_embedding_dims")]
    pub input_dim: usize,
    /// Feature dimension after the linear transform.
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,
    #[serde(default = "default_original_slope")]
    pub leaky_slope: f64,
    #[serde(default)]
    pub weight_seed: WeightSeed,
}

impl Default for OriginalConfig {
    fn default() -> Self {
        Self {
            input_dim: default_embedding_dims(),
            hidden_dim: default_hidden_dim(),
            leaky_slope: default_original_slope(),
            weight_seed: WeightSeed::default(),
        }
    }
}

fn default_hidden_dim() -> usize {
    32
}

fn default_original_slope() -> f64 {
    0.01
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Per-request timeout (seconds).
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_backend_dims")]
    pub dimensions: usize,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Texts embedded per model invocation.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_backend_timeout(),
            dimensions: default_backend_dims(),
            model_id: default_model_id(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_backend_timeout() -> u64 {
    60
}

fn default_backend_dims() -> usize {
    768
}

fn default_model_id() -> String {
    "onnx-community/embeddinggemma-300m-ONNX".to_string()
}

fn default_batch_size() -> usize {
    8
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `TEXTGRAPH_`)
/// 3. Workspace-local config (`.textgraph/config.toml`)
/// 4. User config (`~/.config/textgraph/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&GatConfig>,
) -> Result<GatConfig, GatError> {
    let mut figment = Figment::from(Serialized::defaults(GatConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "textgraph", "textgraph") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".textgraph").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // TEXTGRAPH_PIPELINE__ROUND_TO_ONE_DECIMAL, TEXTGRAPH_BACKEND__TIMEOUT_SECS, ...
    figment = figment.merge(Env::prefixed("TEXTGRAPH_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: GatConfig = figment.extract().map_err(Box::new)?;
    tracing::debug!(
        round = config.pipeline.round_to_one_decimal,
        seed = ?config.original.weight_seed,
        "Loaded attention config"
    );
    Ok(config)
}
