//! Capability Registry: model name → capability descriptor.
//!
//! Loaded once at startup from the model config YAML and never mutated.
//! Any problem with the file is a [`ConfigError`] and is fatal; there is no
//! partial registry.
//!
//! ```yaml
//! models:
//!   - name: stt
//!     capability: speech_to_text
//!     params: [audio_contents, audio_format, language]
//!     output_table: stt_result
//!     output_columns: [job_id, correlation_id, transcription]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::capability::CapabilityKind;
use crate::results::ResultTable;

/// Default location of the model config, relative to the working directory.
pub const DEFAULT_MODEL_CONFIG_PATH: &str = "config/config_model.yaml";

/// How to build, feed and store one capability.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDescriptor {
    /// Matches `ml_models.ml_model_name`.
    pub name: String,
    pub capability: CapabilityKind,
    /// Parameter allow-list applied before construction.
    pub params: Vec<String>,
    pub output_table: ResultTable,
    /// Column allow-list applied to query results.
    pub output_columns: Vec<String>,
}

impl CapabilityDescriptor {
    pub fn accepts(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }
}

/// Errors raised while loading the registry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read model config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model config: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("Model config entry {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Duplicate model name '{0}' in model config")]
    DuplicateName(String),

    #[error("Model '{name}': output table '{table}' does not match capability '{capability}' (expected '{expected}')")]
    TableMismatch {
        name: String,
        table: String,
        capability: CapabilityKind,
        expected: &'static str,
    },

    #[error("Model '{name}': table '{table}' has no column '{column}'")]
    UnknownColumn {
        name: String,
        table: &'static str,
        column: String,
    },

    #[error("Model '{name}': capability '{capability}' does not take parameter '{param}'")]
    UnknownParam {
        name: String,
        capability: CapabilityKind,
        param: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    models: Vec<DescriptorEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorEntry {
    name: String,
    capability: CapabilityKind,
    params: Vec<String>,
    output_table: String,
    output_columns: Vec<String>,
}

/// The loaded, immutable descriptor map.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    descriptors: HashMap<String, CapabilityDescriptor>,
}

impl CapabilityRegistry {
    /// Read and validate the model config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate a model config document.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yml::from_str(raw)?;
        Self::from_entries(file.models)
    }

    fn from_entries(entries: Vec<DescriptorEntry>) -> Result<Self, ConfigError> {
        let mut descriptors = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let descriptor = validate_entry(index, entry)?;
            if descriptors.contains_key(&descriptor.name) {
                return Err(ConfigError::DuplicateName(descriptor.name));
            }
            descriptors.insert(descriptor.name.clone(), descriptor);
        }

        Ok(Self { descriptors })
    }

    /// Build a registry from already-validated descriptors.
    ///
    /// Still rejects duplicate names.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = CapabilityDescriptor>,
    ) -> Result<Self, ConfigError> {
        let mut map = HashMap::new();
        for descriptor in descriptors {
            if map.contains_key(&descriptor.name) {
                return Err(ConfigError::DuplicateName(descriptor.name));
            }
            map.insert(descriptor.name.clone(), descriptor);
        }
        Ok(Self { descriptors: map })
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.descriptors.get(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn validate_entry(index: usize, entry: DescriptorEntry) -> Result<CapabilityDescriptor, ConfigError> {
    let name = entry.name.trim().to_string();
    if name.is_empty() {
        return Err(ConfigError::MissingField { index, field: "name" });
    }
    if entry.output_table.trim().is_empty() {
        return Err(ConfigError::MissingField {
            index,
            field: "output_table",
        });
    }
    if entry.output_columns.is_empty() {
        return Err(ConfigError::MissingField {
            index,
            field: "output_columns",
        });
    }

    let capability = entry.capability;
    let table = capability.result_table();
    if entry.output_table != table.name() {
        return Err(ConfigError::TableMismatch {
            name,
            table: entry.output_table,
            capability,
            expected: table.name(),
        });
    }

    if let Some(column) = entry
        .output_columns
        .iter()
        .find(|c| !table.has_column(c.as_str()))
    {
        return Err(ConfigError::UnknownColumn {
            name,
            table: table.name(),
            column: column.clone(),
        });
    }

    if let Some(param) = entry
        .params
        .iter()
        .find(|p| !capability.parameters().contains(&p.as_str()))
    {
        return Err(ConfigError::UnknownParam {
            name,
            capability,
            param: param.clone(),
        });
    }

    Ok(CapabilityDescriptor {
        name,
        capability,
        params: entry.params,
        output_table: table,
        output_columns: entry.output_columns,
    })
}
