use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexDirConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Optional TOML file with host-supplied operations appended to the
    /// built-in catalog.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexDirConfig {
    /// Directory holding the persisted index artifacts.
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
}

impl Default for IndexDirConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
        }
    }
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("./vector_db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatcherConfig {
    /// How many candidate operations a match returns by default.
    #[serde(default = "default_k")]
    pub default_k: i64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
        }
    }
}

fn default_k() -> i64 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// One of `local`, `ollama`, `openai`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to defaults.
/// A present-but-invalid file is still an error.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index.dir, PathBuf::from("./vector_db"));
        assert_eq!(config.matcher.default_k, 3);
        assert_eq!(config.embedding.provider, "local");
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_src = r#"
            catalog = "./ops.toml"

            [index]
            dir = "./data/index"

            [matcher]
            default_k = 1

            [embedding]
            provider = "ollama"
            model = "nomic-embed-text"
            dims = 768
            url = "http://localhost:11434"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.index.dir, PathBuf::from("./data/index"));
        assert_eq!(config.matcher.default_k, 1);
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.embedding.dims, Some(768));
        assert_eq!(config.embedding.max_retries, 5);
        assert_eq!(config.catalog, Some(PathBuf::from("./ops.toml")));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = load_config_or_default(Path::new("/nonexistent/opdex.toml")).unwrap();
        assert_eq!(config.embedding.provider, "local");
    }
}
