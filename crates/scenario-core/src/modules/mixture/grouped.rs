use crate::modules::helpers::{
    FIRST_REFERENCE_SET, MissingPolicy, ReferenceTable, SECOND_REFERENCE_SET, combine_pair,
    paired_reference_files, partition_columns, write_tables,
};
use crate::modules::traits::FamilyRequest;
use crate::common::table::CsvTable;
use crate::domain::{SynthesisResult, WeightGroup, WorkingArtifact};
use crate::numerics::{linear_mix, mixture_weights};
use std::collections::HashMap;

/// Tag-keyed weights resolved from the experiment parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedWeights {
    groups: Vec<(String, f64)>,
}

impl GroupedWeights {
    pub fn resolve(request: &FamilyRequest<'_>, groups: &[WeightGroup]) -> SynthesisResult<Self> {
        let groups = groups
            .iter()
            .map(|group| Ok((group.tag.clone(), request.number(&group.parameter)?)))
            .collect::<SynthesisResult<Vec<_>>>()?;
        Ok(Self { groups })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            groups: pairs
                .into_iter()
                .map(|(tag, weight)| (tag.into(), weight))
                .collect(),
        }
    }

    /// Weight of the first group whose tag occurs in `column`.
    pub fn weight_for(&self, column: &str) -> Option<f64> {
        self.groups
            .iter()
            .find(|(tag, _)| column.contains(tag.as_str()))
            .map(|(_, weight)| *weight)
    }
}

pub fn apply_grouped_mixture(
    request: &FamilyRequest<'_>,
    groups: &[WeightGroup],
    excluded: &[String],
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let weights = GroupedWeights::resolve(request, groups)?;
    let first_dir = request.reference_set(FIRST_REFERENCE_SET);
    let second_dir = request.reference_set(SECOND_REFERENCE_SET);
    let names = paired_reference_files(&first_dir, &second_dir, request.file_patterns)?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let first = ReferenceTable::load(first_dir.join(&name))?;
        let second = ReferenceTable::load(second_dir.join(&name))?;
        tables.push((name, mix_tables_by_group(first, second, &weights, excluded)?));
    }

    tracing::info!(
        family = request.family,
        groups = groups.len(),
        files = tables.len(),
        "grouped mixture blend"
    );
    write_tables(request.model_dir, request.target, &tables)
}

/// Mixes each mixable column at the weight of the group its name matches.
///
/// Columns matching no group keep set "1"'s values.
pub fn mix_tables_by_group(
    first: ReferenceTable,
    second: ReferenceTable,
    weights: &GroupedWeights,
    excluded: &[String],
) -> SynthesisResult<CsvTable> {
    let mut selection = partition_columns(&first.table, excluded, false);

    let mut column_weights = HashMap::new();
    let mut unmatched = Vec::new();
    for name in selection.float.iter().chain(&selection.integer) {
        match weights.weight_for(name) {
            Some(weight) => {
                column_weights.insert(name.clone(), mixture_weights(weight));
            }
            None => unmatched.push(name.clone()),
        }
    }
    if !unmatched.is_empty() {
        tracing::warn!(
            path = %first.path.display(),
            columns = ?unmatched,
            "columns match no weight group and pass through"
        );
    }
    selection.retain(|name| column_weights.contains_key(name));

    combine_pair(
        first,
        second,
        &selection,
        MissingPolicy::ZeroFillRestore,
        |name, a, b| {
            column_weights
                .get(name)
                .map_or(a, |&(weight_1, weight_2)| linear_mix(a, b, weight_1, weight_2))
        },
    )
}
