//! Raw topology document as written by the user.
//!
//! YAML is the native format; JSON and TOML documents with the same shape
//! are accepted and selected by file extension.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Serialization format of a topology document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick a format from the file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

/// Scalar value of the flat `config` table
///
/// Values render the way the provisioning templates expect them:
/// `True`/`False` for booleans, `None` for an empty value, and floats
/// always carry a fractional part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{x:.1}")
            }
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Null => f.write_str("None"),
        }
    }
}

/// One entry of the `nodes` map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawHost {
    pub role: String,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub modules: Vec<String>,
}

/// The topology document before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTopology {
    #[serde(default)]
    pub config: BTreeMap<String, ConfigValue>,
    #[serde(default)]
    pub nodes: IndexMap<String, RawHost>,
    #[serde(default)]
    pub openstack_version: Option<String>,
    #[serde(default)]
    pub base_vm: Option<String>,
    #[serde(default)]
    pub base_user: Option<String>,
    #[serde(default)]
    pub base_distribution: Option<String>,
    #[serde(default)]
    pub base_hostname: Option<String>,
}

impl RawTopology {
    /// Parse document text in the given format. `path` is only used for
    /// error messages.
    pub fn parse(text: &str, format: DocumentFormat, path: &Path) -> Result<Self> {
        let parsed = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Read and parse a document, choosing the format by extension.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let format = DocumentFormat::from_path(path);
        log::debug!("Parsing {} as {}", path.display(), format.extension());
        Self::parse(&text, format, path)
    }
}
