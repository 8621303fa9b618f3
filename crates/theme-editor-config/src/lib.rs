use anyhow::Context;
use serde::{Deserialize, Serialize};
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

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding theme files
    pub themes_path: PathBuf,
    /// A plain click on a component selects the whole component
    #[serde(default = "enabled")]
    pub click_selects_component: bool,
    /// Drop display-only component titles when saving a theme
    #[serde(default = "enabled")]
    pub strip_titles_on_save: bool,
}

const CONFIG_FILE: &str = "~/.config/theme-editor/config.toml";
const DEFAULT_THEME: &str = "theme.html";

impl Config {
    pub fn new(themes_path: impl Into<PathBuf>) -> Self {
        Self {
            themes_path: themes_path.into(),
            click_selects_component: true,
            strip_titles_on_save: true,
        }
    }

    /// Read a config file; a missing file is `Ok(None)`
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        let content = match std::fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::ConfigReadError {
                    config_path: config_path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&content, config_path).map(Some)
    }

    /// Parse TOML content, expanding `~` and `$VARS` in `themes_path`
    fn parse(content: &str, config_path: &Path) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            themes_path: expand_path(&config.themes_path),
            ..config
        })
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        let dir = config_path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
        std::fs::write(config_path, toml::to_string_pretty(self)?)
            .with_context(|| format!("writing config file {}", config_path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(CONFIG_FILE).into_owned())
    }

    /// Theme opened when none is named explicitly
    pub fn default_theme(&self) -> PathBuf {
        self.themes_path.join(DEFAULT_THEME)
    }
}

/// Shell-expand a path, leaving it untouched when a variable is undefined
fn expand_path(path: &Path) -> PathBuf {
    shellexpand::full(&path.to_string_lossy())
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}
