use arbor_engine::{ContentRule, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document opened when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    pub schema: SchemaConfig,
    /// Extra markdown shortcuts, trigger to block type.
    pub shortcuts: BTreeMap<String, String>,
    pub search: SearchConfig,
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub inline: Vec<String>,
    pub void: Vec<String>,
    pub read_only: Vec<String>,
    pub unselectable: Vec<String>,
    pub containers: BTreeMap<String, ContainerConfig>,
    /// Block inserted when a document ends up with no blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_fill: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    pub removable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mark: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mark: "highlight".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub iterations_per_dirty_path: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            iterations_per_dirty_path: arbor_engine::DEFAULT_ITERATIONS_PER_DIRTY_PATH,
        }
    }
}

impl SchemaConfig {
    /// Classification and content rules as an engine schema
    pub fn to_schema(&self) -> Schema {
        let mut schema = Schema::new()
            .with_inline(&self.inline)
            .with_void(&self.void)
            .with_read_only(&self.read_only)
            .with_unselectable(&self.unselectable);
        for (tag, container) in &self.containers {
            let rule = match &container.fill {
                Some(fill) => ContentRule::blocks_filled_with(fill.clone()),
                None => ContentRule::Blocks {
                    fill: None,
                    removable: container.removable,
                },
            };
            schema.set_content(tag.clone(), rule);
        }
        if let Some(tag) = &self.root_fill {
            schema = schema.with_root_fill(tag.clone());
        }
        schema
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the document path
        config.document = config
            .document
            .map(|document| Self::expand_path(&document).unwrap_or(document));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/arbor");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    pub fn to_schema(&self) -> Schema {
        self.schema.to_schema()
    }
}
