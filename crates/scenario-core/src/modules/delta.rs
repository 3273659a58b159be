//! Delta extrapolation from reference set "1" toward set "2".
//!
//! `out = first + (second - first) * w` with an unconstrained `w`. Gaps are
//! carried cell by cell: a gap on either side leaves the output cell empty,
//! and nothing else is blanked.

use super::helpers::{
    FIRST_REFERENCE_SET, MissingPolicy, ReferenceTable, SECOND_REFERENCE_SET, combine_pair,
    paired_reference_files, partition_columns, write_tables,
};
use super::traits::FamilyRequest;
use crate::common::table::CsvTable;
use crate::domain::{SynthesisResult, WorkingArtifact};
use crate::numerics::delta_extrapolate;

pub fn apply_delta(
    request: &FamilyRequest<'_>,
    parameter: &str,
    excluded: &[String],
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let weight = request.number(parameter)?;
    let first_dir = request.reference_set(FIRST_REFERENCE_SET);
    let second_dir = request.reference_set(SECOND_REFERENCE_SET);
    let names = paired_reference_files(&first_dir, &second_dir, request.file_patterns)?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let first = ReferenceTable::load(first_dir.join(&name))?;
        let second = ReferenceTable::load(second_dir.join(&name))?;
        tables.push((name, extrapolate_tables(first, second, weight, excluded)?));
    }

    tracing::info!(
        family = request.family,
        parameter,
        weight,
        files = tables.len(),
        "delta extrapolation"
    );
    write_tables(request.model_dir, request.target, &tables)
}

pub fn extrapolate_tables(
    first: ReferenceTable,
    second: ReferenceTable,
    weight: f64,
    excluded: &[String],
) -> SynthesisResult<CsvTable> {
    let selection = partition_columns(&first.table, excluded, false);
    combine_pair(first, second, &selection, MissingPolicy::Propagate, |_, a, b| {
        delta_extrapolate(a, b, weight)
    })
}
