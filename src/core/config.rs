//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Nesting limit applied when no configuration overrides it
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = ".jsonform.yaml";

/// jsonform configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default enum sources file used when `--sources` is not given
    pub enum_sources: Option<PathBuf>,

    /// Maximum schema nesting depth before compilation is aborted
    pub max_depth: Option<usize>,

    /// Default output format (json, yaml)
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/jsonform/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Working directory config (.jsonform.yaml)
        if let Ok(cwd) = std::env::current_dir() {
            if let Some(local) = Self::read_file(&cwd.join(LOCAL_CONFIG_FILE)) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        if let Ok(sources) = std::env::var("JSONFORM_SOURCES") {
            config.enum_sources = Some(PathBuf::from(sources));
        }
        if let Ok(depth) = std::env::var("JSONFORM_MAX_DEPTH") {
            match depth.parse() {
                Ok(depth) => config.max_depth = Some(depth),
                Err(_) => tracing::warn!("Ignoring non-numeric JSONFORM_MAX_DEPTH '{}'", depth),
            }
        }

        config
    }

    /// Parse a config document; unreadable layers are skipped by `load`
    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_yaml_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Skipping config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "jsonform")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.enum_sources.is_some() {
            self.enum_sources = other.enum_sources;
        }
        if other.max_depth.is_some() {
            self.max_depth = other.max_depth;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Effective nesting limit
    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }
}
