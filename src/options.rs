//! Generator options and where they are loaded from.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options file looked for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "csdl-diagram.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration {path}: not valid TOML ({toml}) or YAML ({yaml})")]
    Parse {
        path: PathBuf,
        toml: String,
        yaml: String,
    },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Type names left out of the diagram, compared case-insensitively.
    ///
    /// Skipping the conventional `Entity` root gives every entity that
    /// derives from it (or from nothing) a synthetic `id` property instead.
    #[serde(default = "default_skip_list")]
    pub skip_list: Vec<String>,

    /// Namespace prefixes that force qualified names even when the model
    /// declares a single namespace.
    #[serde(default = "default_qualify_prefixes")]
    pub qualify_prefixes: Vec<String>,
}

fn default_skip_list() -> Vec<String> {
    vec!["Entity".to_string()]
}

fn default_qualify_prefixes() -> Vec<String> {
    vec!["microsoft.graph.".to_string()]
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            skip_list: default_skip_list(),
            qualify_prefixes: default_qualify_prefixes(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_skip_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_list = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `name` (qualified or not) is on the skip list.
    pub fn skips(&self, name: &str) -> bool {
        let local = crate::csdl::local_name(name);
        self.skip_list.iter().any(|s| s.eq_ignore_ascii_case(local))
    }

    pub fn qualifies_namespace(&self, namespace: &str) -> bool {
        self.qualify_prefixes.iter().any(|prefix| {
            namespace
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Read an options file, trying TOML first and then YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match Self::from_toml(&content) {
            Ok(options) => Ok(options),
            Err(toml_err) => Self::from_yaml(&content).map_err(|yaml_err| ConfigError::Parse {
                path: path.to_path_buf(),
                toml: toml_err.to_string(),
                yaml: yaml_err.to_string(),
            }),
        }
    }

    /// Find options for a run.
    ///
    /// Search order:
    /// 1. `explicit_path`, which must exist
    /// 2. [`LOCAL_CONFIG_FILE`] in the working directory
    /// 3. defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            info!(path = path.display().to_string(); "Loading options from explicit path");
            return Self::from_file(path);
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.exists() {
            info!(path = local.display().to_string(); "Loading options from local path");
            return Self::from_file(local);
        }

        debug!("No options file found, using defaults");
        Ok(Self::default())
    }
}
