//! Model configuration: years, reference data root, scope parameters and the
//! declarative family table.

use crate::domain::{FamilyDescriptor, FamilyKind, ModelYears, ScenarioError, ScopeParameter};
use crate::modules::runner::ModelRunConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    pub model_type: String,
    #[serde(default)]
    pub model_variant: Option<String>,
    pub base_year: i64,
    pub model_year: i64,
    /// Root of every family's reference sets.
    pub reference_root: PathBuf,
    #[serde(default)]
    pub parameters: Vec<ScopeParameter>,
    pub families: Vec<FamilyDescriptor>,
    #[serde(default)]
    pub runner: Option<ModelRunConfig>,
}

impl ModelConfig {
    /// Loads and validates a JSON config; a relative `reference_root` is taken
    /// from the config file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ModelConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&content).map_err(|source| ModelConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.reference_root.is_relative() {
            if let Some(parent) = path.parent() {
                config.reference_root = parent.join(&config.reference_root);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|source| ModelConfigError::Parse {
                path: PathBuf::from("<inline-config>"),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ModelConfigError> {
        let mut names = BTreeSet::new();
        for family in &self.families {
            if !names.insert(family.name.as_str()) {
                return Err(ModelConfigError::Invalid(format!(
                    "family '{}' is declared more than once",
                    family.name
                )));
            }

            let parameters = family.kind.parameter_names();
            if parameters.is_empty() || parameters.iter().any(|name| name.trim().is_empty()) {
                return Err(ModelConfigError::Invalid(format!(
                    "family '{}' has no trigger parameter",
                    family.name
                )));
            }

            if let FamilyKind::Scale { max_threshold, .. } = &family.kind {
                if !(max_threshold.is_finite() && *max_threshold > 0.0) {
                    return Err(ModelConfigError::Invalid(format!(
                        "family '{}' needs a positive max_threshold, got {}",
                        family.name, max_threshold
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn years(&self) -> ModelYears {
        ModelYears {
            base_year: self.base_year,
            model_year: self.model_year,
        }
    }

    pub fn family(&self, name: &str) -> Option<&FamilyDescriptor> {
        self.families.iter().find(|family| family.name == name)
    }

    pub fn reference_dir(&self, family: &FamilyDescriptor) -> PathBuf {
        self.reference_root.join(&family.directory)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelConfigError {
    #[error("failed to read model config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse model config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid model config: {0}")]
    Invalid(String),
}

impl From<ModelConfigError> for ScenarioError {
    fn from(error: ModelConfigError) -> Self {
        let message = error.to_string();
        match error {
            ModelConfigError::Read { .. } => ScenarioError::io_system("IO.MODEL_CONFIG", message),
            ModelConfigError::Parse { .. } | ModelConfigError::Invalid(_) => {
                ScenarioError::input_validation("INPUT.MODEL_CONFIG", message)
            }
        }
    }
}
