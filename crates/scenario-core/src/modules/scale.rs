use super::helpers::{ReferenceTable, list_reference_files, write_tables};
use super::traits::FamilyRequest;
use crate::common::table::{ColumnKind, CsvTable};
use crate::domain::{ColumnTargets, SynthesisError, SynthesisResult, WorkingArtifact};
use crate::numerics::clamp_threshold;
use std::collections::BTreeMap;

/// A resolved `(factor, columns)` pair of a scale mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleFactor {
    pub factor: f64,
    pub columns: Vec<String>,
}

/// Scales every file of the family's single reference directory.
///
/// Mapped parameters absent from the experiment leave their columns as they
/// are. A mapped column missing from any file fails the family before anything
/// is written.
pub fn apply_scale(
    request: &FamilyRequest<'_>,
    columns: &BTreeMap<String, ColumnTargets>,
    max_threshold: f64,
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let mut factors = Vec::new();
    for (parameter, targets) in columns {
        if !request.params.contains(parameter) {
            continue;
        }
        factors.push(ScaleFactor {
            factor: request.number(parameter)?,
            columns: targets.names().into_iter().map(str::to_string).collect(),
        });
    }

    let names = list_reference_files(request.reference_dir, request.file_patterns)?;
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let reference = ReferenceTable::load(request.reference_dir.join(&name))?;
        tables.push((name, scale_table(reference, &factors, max_threshold)?));
    }

    tracing::info!(
        family = request.family,
        factors = factors.len(),
        files = tables.len(),
        "column scale"
    );
    write_tables(request.model_dir, request.target, &tables)
}

/// Multiplies the mapped columns and clamps them into `[-max, max]`.
///
/// Gaps count as zero while scaling; if the file had any gap, zeros are
/// written back as gaps. A scaled integer column stays integral only when
/// every product is a whole number.
pub fn scale_table(
    reference: ReferenceTable,
    factors: &[ScaleFactor],
    max_threshold: f64,
) -> SynthesisResult<CsvTable> {
    let ReferenceTable { path, mut table } = reference;

    for factor in factors {
        for name in &factor.columns {
            let numeric = table
                .column(name)
                .is_some_and(|column| column.kind().is_numeric());
            if !numeric {
                return Err(SynthesisError::ColumnMismatch {
                    path,
                    column: name.clone(),
                });
            }
        }
    }

    let restore = table.has_missing();
    table.fill_missing(0.0);

    for factor in factors {
        for name in &factor.columns {
            let Some(column) = table.column_mut(name) else {
                continue;
            };
            let kind = column.kind();
            let Some(values) = column.numeric_mut() else {
                continue;
            };
            let mut integral = true;
            for value in values.iter_mut().flatten() {
                *value = clamp_threshold(*value * factor.factor, max_threshold);
                integral &= value.fract() == 0.0;
            }
            if kind == ColumnKind::Integer && !integral {
                column.set_numeric_kind(ColumnKind::Float);
            }
        }
    }

    if restore {
        table.restore_missing_zeros();
    }
    Ok(table)
}
