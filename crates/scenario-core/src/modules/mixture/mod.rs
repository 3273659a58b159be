//! Linear mixture of two reference sets.
//!
//! For a weight `p`, set "2" contributes `p` and set "1" contributes `1 - p`.
//! Float columns are mixed exactly; integer columns are mixed and then rounded
//! half to even. Gaps count as zero during the arithmetic, and when either
//! source file had a gap every zero of the output is written back as `NA`.
//! That reconstitutes "not applicable" cells at the cost of also blanking
//! genuine zeros.

mod grouped;

pub use grouped::{GroupedWeights, apply_grouped_mixture, mix_tables_by_group};

use super::helpers::{
    FIRST_REFERENCE_SET, MissingPolicy, ReferenceTable, SECOND_REFERENCE_SET, combine_pair,
    paired_reference_files, partition_columns, write_tables,
};
use super::traits::FamilyRequest;
use crate::common::table::CsvTable;
use crate::domain::{SynthesisResult, WorkingArtifact};
use crate::numerics::{linear_mix, mixture_weights};

/// Column handling shared by the two-point families.
#[derive(Debug, Clone, Copy)]
pub struct BlendColumns<'a> {
    pub excluded: &'a [String],
    pub integers_as_float: bool,
}

pub fn apply_mixture(
    request: &FamilyRequest<'_>,
    parameter: &str,
    columns: BlendColumns<'_>,
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let weight = request.number(parameter)?;
    let first_dir = request.reference_set(FIRST_REFERENCE_SET);
    let second_dir = request.reference_set(SECOND_REFERENCE_SET);
    let names = paired_reference_files(&first_dir, &second_dir, request.file_patterns)?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let first = ReferenceTable::load(first_dir.join(&name))?;
        let second = ReferenceTable::load(second_dir.join(&name))?;
        tables.push((name, mix_tables(first, second, weight, columns)?));
    }

    tracing::info!(
        family = request.family,
        parameter,
        weight,
        files = tables.len(),
        "mixture blend"
    );
    write_tables(request.model_dir, request.target, &tables)
}

/// Mixes one pair of reference tables at weight `p`.
pub fn mix_tables(
    first: ReferenceTable,
    second: ReferenceTable,
    p: f64,
    columns: BlendColumns<'_>,
) -> SynthesisResult<CsvTable> {
    let (weight_1, weight_2) = mixture_weights(p);
    let selection = partition_columns(&first.table, columns.excluded, columns.integers_as_float);
    combine_pair(
        first,
        second,
        &selection,
        MissingPolicy::ZeroFillRestore,
        |_, a, b| linear_mix(a, b, weight_1, weight_2),
    )
}
