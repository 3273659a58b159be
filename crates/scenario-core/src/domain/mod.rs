pub mod errors;

pub use errors::{
    ScenarioError, ScenarioErrorCategory, ScenarioResult, SynthesisError, SynthesisResult,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_EXCLUDED_COLUMNS: [&str; 2] = ["Year", "Geo"];
pub const DEFAULT_MAX_THRESHOLD: f64 = 1.0e9;
pub const DEFAULT_TARGET_DIR: &str = "inputs";
pub const DEFAULT_YEAR_COLUMN: &str = "Year";

/// A scalar experiment value: a weight, a scale factor or a category key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
}

impl ParameterValue {
    /// Finite numeric value; `NaN` and infinities do not count as numbers.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
        };
        value.filter(|value| value.is_finite())
    }

    /// Directory-style label; integral numbers drop their fraction (`1.0` -> `"1"`).
    pub fn category_label(&self) -> String {
        match self {
            Self::Number(value) if value.is_finite() && value.fract() == 0.0 => {
                format!("{}", *value as i64)
            }
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Experiment parameters keyed by upper-cased name.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(
    from = "BTreeMap<String, ParameterValue>",
    into = "BTreeMap<String, ParameterValue>"
)]
pub struct ParameterDictionary {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParameterValue>) {
        self.values.insert(normalize_name(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Numeric value of `name`, or the error the owning family reports.
    pub fn number(&self, family: &str, name: &str) -> SynthesisResult<f64> {
        let value = self
            .get(name)
            .ok_or_else(|| SynthesisError::MissingParameter {
                family: family.to_string(),
                parameter: name.to_string(),
            })?;
        value
            .as_number()
            .ok_or_else(|| SynthesisError::InvalidParameter {
                parameter: name.to_string(),
                value: value.to_string(),
            })
    }

    /// Fills every scope parameter absent from the dictionary with its default.
    pub fn with_defaults(mut self, scope: &[ScopeParameter]) -> Self {
        for parameter in scope {
            if self.contains(&parameter.name) {
                continue;
            }
            if let Some(default) = &parameter.default {
                tracing::warn!(
                    parameter = %parameter.name,
                    default = %default,
                    "using scope default"
                );
                self.insert(&parameter.name, default.clone());
            }
        }
        self
    }
}

impl From<BTreeMap<String, ParameterValue>> for ParameterDictionary {
    fn from(map: BTreeMap<String, ParameterValue>) -> Self {
        map.into_iter().collect()
    }
}

impl From<ParameterDictionary> for BTreeMap<String, ParameterValue> {
    fn from(params: ParameterDictionary) -> Self {
        params.values
    }
}

impl<K: AsRef<str>> FromIterator<(K, ParameterValue)> for ParameterDictionary {
    fn from_iter<T: IntoIterator<Item = (K, ParameterValue)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScopeParameter {
    pub name: String,
    #[serde(default)]
    pub default: Option<ParameterValue>,
}

/// A file written into the experiment's model directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkingArtifact {
    pub relative_path: PathBuf,
}

impl WorkingArtifact {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }
}

/// Base and future years of the modelled horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelYears {
    pub base_year: i64,
    pub model_year: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub experiment_id: String,
    pub params: ParameterDictionary,
    pub model_dir: PathBuf,
}

impl SynthesisRequest {
    pub fn new(
        experiment_id: impl Into<String>,
        params: ParameterDictionary,
        model_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            params,
            model_dir: model_dir.into(),
        }
    }
}

/// One entry of the declarative family table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FamilyDescriptor {
    pub name: String,
    /// Reference set root, relative to the configured reference root.
    pub directory: PathBuf,
    /// Optional glob filters over reference file names.
    #[serde(default)]
    pub files: Vec<String>,
    /// Destination, relative to the model directory.
    #[serde(default = "default_target_dir")]
    pub target: PathBuf,
    #[serde(flatten)]
    pub kind: FamilyKind,
}

impl FamilyDescriptor {
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>, kind: FamilyKind) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            files: Vec::new(),
            target: default_target_dir(),
            kind,
        }
    }

    /// Whether the experiment carries the parameters that switch this family on.
    pub fn is_triggered_by(&self, params: &ParameterDictionary) -> bool {
        let names = self.kind.parameter_names();
        if names.is_empty() {
            return false;
        }
        match self.kind.trigger() {
            Trigger::Any => names.iter().any(|name| params.contains(name)),
            Trigger::All => names.iter().all(|name| params.contains(name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Any,
    All,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FamilyKind {
    Categorical {
        parameter: String,
        #[serde(default)]
        categories: BTreeMap<String, String>,
    },
    Mixture {
        parameter: String,
        #[serde(default = "default_excluded_columns")]
        excluded_columns: Vec<String>,
        #[serde(default)]
        integers_as_float: bool,
    },
    Delta {
        parameter: String,
        #[serde(default = "default_excluded_columns")]
        excluded_columns: Vec<String>,
    },
    Scale {
        columns: BTreeMap<String, ColumnTargets>,
        #[serde(default = "default_max_threshold")]
        max_threshold: f64,
    },
    GroupedMixture {
        groups: Vec<WeightGroup>,
        #[serde(default = "default_excluded_columns")]
        excluded_columns: Vec<String>,
    },
    GrowthCompound {
        parameter: String,
        file: String,
        columns: Vec<String>,
        #[serde(default = "default_year_column")]
        year_column: String,
    },
    YearAssign {
        file: String,
        assignments: BTreeMap<String, String>,
        #[serde(default = "default_year_column")]
        year_column: String,
    },
}

impl FamilyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Categorical { .. } => "categorical",
            Self::Mixture { .. } => "mixture",
            Self::Delta { .. } => "delta",
            Self::Scale { .. } => "scale",
            Self::GroupedMixture { .. } => "grouped_mixture",
            Self::GrowthCompound { .. } => "growth_compound",
            Self::YearAssign { .. } => "year_assign",
        }
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        match self {
            Self::Categorical { parameter, .. }
            | Self::Mixture { parameter, .. }
            | Self::Delta { parameter, .. }
            | Self::GrowthCompound { parameter, .. } => vec![parameter.as_str()],
            Self::Scale { columns, .. } => columns.keys().map(String::as_str).collect(),
            Self::GroupedMixture { groups, .. } => {
                groups.iter().map(|group| group.parameter.as_str()).collect()
            }
            Self::YearAssign { assignments, .. } => {
                assignments.values().map(String::as_str).collect()
            }
        }
    }

    pub const fn trigger(&self) -> Trigger {
        match self {
            Self::GroupedMixture { .. } | Self::YearAssign { .. } => Trigger::All,
            _ => Trigger::Any,
        }
    }
}

impl Display for FamilyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column target of a scale mapping: one column name or several.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ColumnTargets {
    One(String),
    Many(Vec<String>),
}

impl ColumnTargets {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeightGroup {
    /// Substring selecting the columns this weight applies to.
    pub tag: String,
    pub parameter: String,
}

fn default_target_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TARGET_DIR)
}

pub fn default_excluded_columns() -> Vec<String> {
    DEFAULT_EXCLUDED_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect()
}

fn default_max_threshold() -> f64 {
    DEFAULT_MAX_THRESHOLD
}

fn default_year_column() -> String {
    DEFAULT_YEAR_COLUMN.to_string()
}
