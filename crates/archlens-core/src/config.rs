use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArchLensError, Result};

/// Knobs for the graph analysis pass. Passed explicitly into each component
/// entry point; there is no ambient global configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Upper bound on the number of cycles the DFS will emit.
    #[serde(default = "AnalysisConfig::default_cycle_limit")]
    pub cycle_limit: usize,
    /// How many dependency magnets to rank.
    #[serde(default = "AnalysisConfig::default_top_magnets")]
    pub top_magnets: usize,
    /// How many oversized packages to rank.
    #[serde(default = "AnalysisConfig::default_top_oversized")]
    pub top_oversized: usize,
    /// How many sample files to attach per magnet.
    #[serde(default = "AnalysisConfig::default_sample_files")]
    pub sample_files: usize,
}

impl AnalysisConfig {
    fn default_cycle_limit() -> usize {
        5
    }

    fn default_top_magnets() -> usize {
        5
    }

    fn default_top_oversized() -> usize {
        5
    }

    fn default_sample_files() -> usize {
        3
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cycle_limit: Self::default_cycle_limit(),
            top_magnets: Self::default_top_magnets(),
            top_oversized: Self::default_top_oversized(),
            sample_files: Self::default_sample_files(),
        }
    }
}

/// Connection settings for an OpenAI-compatible chat-completions endpoint
/// (LM Studio, Ollama, or any server speaking the same protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL including the `/v1` segment.
    #[serde(default = "LlmConfig::default_base_url")]
    pub base_url: String,
    /// Model identifier as loaded on the endpoint.
    #[serde(default = "LlmConfig::default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "LlmConfig::default_top_p")]
    pub top_p: f32,
    #[serde(default = "LlmConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "LlmConfig::default_max_retries")]
    pub max_retries: u32,
    /// Optional bearer token; local endpoints usually need none.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl LlmConfig {
    fn default_base_url() -> String {
        "http://localhost:1234/v1".to_string()
    }

    fn default_model() -> String {
        "qwen/qwen3-coder-30b".to_string()
    }

    fn default_top_p() -> f32 {
        1.0
    }

    fn default_timeout_secs() -> u64 {
        120
    }

    fn default_max_retries() -> u32 {
        3
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            temperature: 0.0,
            top_p: Self::default_top_p(),
            timeout_secs: Self::default_timeout_secs(),
            max_retries: Self::default_max_retries(),
            api_key: None,
        }
    }
}

/// Settings for the response verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Root prefix of the analyzed codebase's packages. Any token shaped
    /// `<root>.<segment>...` in an answer must be grounded in evidence or
    /// carry the `[NEW]` marker on its line.
    #[serde(default = "VerifyConfig::default_package_root")]
    pub package_root: String,
}

impl VerifyConfig {
    fn default_package_root() -> String {
        "net.lingala.zip4j".to_string()
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            package_root: Self::default_package_root(),
        }
    }
}

/// Top-level configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchLensConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
}

impl ArchLensConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| ArchLensError::Config(format!("{}: {}", path.display(), e)))
    }
}
