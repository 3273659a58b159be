use super::helpers::{ensure_target_dir, list_reference_files};
use super::serialization::copy_binary_artifact;
use super::traits::FamilyRequest;
use crate::domain::{SynthesisError, SynthesisResult, WorkingArtifact};
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// Copies the reference set selected by `parameter` into the target directory.
///
/// The parameter's label is looked up in `categories` first; an unmapped label
/// names the sub-directory directly. Files are copied unmodified and replace
/// same-named working files.
pub fn apply_categorical(
    request: &FamilyRequest<'_>,
    parameter: &str,
    categories: &BTreeMap<String, String>,
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let value = request
        .params
        .get(parameter)
        .ok_or_else(|| SynthesisError::MissingParameter {
            family: request.family.to_string(),
            parameter: parameter.to_string(),
        })?;
    let label = value.category_label();
    let sub_dir = categories.get(&label).unwrap_or(&label);

    let source_dir = request.reference_set(sub_dir);
    if !is_single_segment(sub_dir) || !source_dir.is_dir() {
        return Err(SynthesisError::MissingCategory {
            family: request.family.to_string(),
            category: label,
            path: source_dir,
        });
    }

    let names = list_reference_files(&source_dir, request.file_patterns)?;
    let target_dir = ensure_target_dir(request.model_dir, request.target)?;
    let mut artifacts = Vec::with_capacity(names.len());
    for name in names {
        let source = source_dir.join(&name);
        let target = target_dir.join(&name);
        copy_binary_artifact(&source, &target).map_err(|error| SynthesisError::io(&source, error))?;
        tracing::debug!(
            family = request.family,
            source = %source.display(),
            "copied categorical input"
        );
        artifacts.push(WorkingArtifact::new(request.target.join(&name)));
    }
    Ok(artifacts)
}

/// A category must name one sub-directory of the family root.
fn is_single_segment(sub_dir: &str) -> bool {
    let mut components = Path::new(sub_dir).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
