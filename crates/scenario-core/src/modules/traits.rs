use crate::domain::{ModelYears, ParameterDictionary, SynthesisResult, WorkingArtifact};
use std::path::{Path, PathBuf};

/// Everything one family needs to materialise its working inputs.
#[derive(Debug, Clone, Copy)]
pub struct FamilyRequest<'a> {
    pub family: &'a str,
    pub params: &'a ParameterDictionary,
    /// Root of the family's reference sets.
    pub reference_dir: &'a Path,
    pub model_dir: &'a Path,
    /// Destination relative to `model_dir`.
    pub target: &'a Path,
    pub file_patterns: &'a [String],
    pub years: ModelYears,
}

impl FamilyRequest<'_> {
    pub fn reference_set(&self, sub_key: &str) -> PathBuf {
        self.reference_dir.join(sub_key)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.model_dir.join(self.target)
    }

    pub fn number(&self, parameter: &str) -> SynthesisResult<f64> {
        self.params.number(self.family, parameter)
    }
}

pub trait FamilyTransform {
    fn apply(&self, request: &FamilyRequest<'_>) -> SynthesisResult<Vec<WorkingArtifact>>;
}
