use super::categorical::apply_categorical;
use super::delta::apply_delta;
use super::growth::{TemplateColumns, apply_growth};
use super::mixture::{BlendColumns, apply_grouped_mixture, apply_mixture};
use super::scale::apply_scale;
use super::traits::{FamilyRequest, FamilyTransform};
use super::year_assign::apply_year_assign;
use crate::common::config::ModelConfig;
use crate::domain::{
    FamilyDescriptor, FamilyKind, ScenarioError, SynthesisError, SynthesisRequest,
    SynthesisResult, WorkingArtifact,
};

impl FamilyTransform for FamilyKind {
    fn apply(&self, request: &FamilyRequest<'_>) -> SynthesisResult<Vec<WorkingArtifact>> {
        match self {
            Self::Categorical {
                parameter,
                categories,
            } => apply_categorical(request, parameter, categories),
            Self::Mixture {
                parameter,
                excluded_columns,
                integers_as_float,
            } => apply_mixture(
                request,
                parameter,
                BlendColumns {
                    excluded: excluded_columns,
                    integers_as_float: *integers_as_float,
                },
            ),
            Self::Delta {
                parameter,
                excluded_columns,
            } => apply_delta(request, parameter, excluded_columns),
            Self::Scale {
                columns,
                max_threshold,
            } => apply_scale(request, columns, *max_threshold),
            Self::GroupedMixture {
                groups,
                excluded_columns,
            } => apply_grouped_mixture(request, groups, excluded_columns),
            Self::GrowthCompound {
                parameter,
                file,
                columns,
                year_column,
            } => apply_growth(
                request,
                parameter,
                TemplateColumns { file, year_column },
                columns,
            ),
            Self::YearAssign {
                file,
                assignments,
                year_column,
            } => apply_year_assign(request, TemplateColumns { file, year_column }, assignments),
        }
    }
}

/// A family that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOutcome {
    pub name: String,
    pub kind: &'static str,
    pub artifacts: Vec<WorkingArtifact>,
}

#[derive(Debug)]
pub struct FamilyFailure {
    pub name: String,
    pub error: SynthesisError,
}

/// Per-family results of one experiment's synthesis.
#[derive(Debug, Default)]
pub struct SynthesisReport {
    pub applied: Vec<FamilyOutcome>,
    /// Families whose trigger parameters were absent.
    pub skipped: Vec<String>,
    pub failures: Vec<FamilyFailure>,
}

impl SynthesisReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &WorkingArtifact> {
        self.applied
            .iter()
            .flat_map(|outcome| outcome.artifacts.iter())
    }

    /// The report itself, or one error carrying the first failure's category
    /// and naming every failed family.
    pub fn into_result(self) -> Result<Self, ScenarioError> {
        if self.failures.is_empty() {
            return Ok(self);
        }

        let converted = ScenarioError::from(&self.failures[0].error);
        let message = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.name, failure.error))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ScenarioError::new(
            converted.category(),
            converted.placeholder(),
            format!(
                "{} of {} families failed: {}",
                self.failures.len(),
                self.failures.len() + self.applied.len(),
                message
            ),
        ))
    }
}

/// Drives the family table of one model configuration.
#[derive(Debug, Clone)]
pub struct ScenarioSynthesizer {
    config: ModelConfig,
}

impl ScenarioSynthesizer {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Applies every triggered family into the request's model directory.
    ///
    /// A failing family is recorded and the remaining families still run.
    pub fn synthesize(&self, request: &SynthesisRequest) -> SynthesisReport {
        let params = request.params.clone().with_defaults(&self.config.parameters);
        let mut report = SynthesisReport::default();

        tracing::info!(
            experiment = %request.experiment_id,
            model_dir = %request.model_dir.display(),
            parameters = params.len(),
            "synthesizing working inputs"
        );

        for family in &self.config.families {
            if !family.is_triggered_by(&params) {
                tracing::debug!(family = %family.name, "no trigger parameter, skipped");
                report.skipped.push(family.name.clone());
                continue;
            }

            let reference_dir = self.config.reference_dir(family);
            let family_request = FamilyRequest {
                family: &family.name,
                params: &params,
                reference_dir: &reference_dir,
                model_dir: &request.model_dir,
                target: &family.target,
                file_patterns: &family.files,
                years: self.config.years(),
            };

            match family.kind.apply(&family_request) {
                Ok(artifacts) => {
                    tracing::info!(
                        family = %family.name,
                        kind = family.kind.as_str(),
                        files = artifacts.len(),
                        "family applied"
                    );
                    report.applied.push(FamilyOutcome {
                        name: family.name.clone(),
                        kind: family.kind.as_str(),
                        artifacts,
                    });
                }
                Err(error) => {
                    tracing::error!(family = %family.name, error = %error, "family failed");
                    report.failures.push(FamilyFailure {
                        name: family.name.clone(),
                        error,
                    });
                }
            }
        }

        report
    }

    /// Families of the table, in declaration order.
    pub fn families(&self) -> &[FamilyDescriptor] {
        &self.config.families
    }
}
