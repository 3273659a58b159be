use super::growth::TemplateColumns;
use super::helpers::{ReferenceTable, numeric_column, write_tables};
use super::traits::FamilyRequest;
use crate::common::table::{ColumnKind, CsvTable};
use crate::domain::{SynthesisResult, WorkingArtifact};
use std::collections::BTreeMap;

/// Sets each assigned column to its parameter's value on the model-year rows.
///
/// Every assigned parameter must be present.
pub fn apply_year_assign(
    request: &FamilyRequest<'_>,
    template: TemplateColumns<'_>,
    assignments: &BTreeMap<String, String>,
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let mut values = Vec::with_capacity(assignments.len());
    for (column, parameter) in assignments {
        values.push((column.clone(), request.number(parameter)?));
    }

    let reference = ReferenceTable::load(request.reference_dir.join(template.file))?;
    let table = assign_year_values(
        reference,
        template.year_column,
        request.years.model_year,
        &values,
    )?;

    tracing::info!(
        family = request.family,
        model_year = request.years.model_year,
        columns = values.len(),
        "year assignment"
    );
    write_tables(
        request.model_dir,
        request.target,
        &[(template.file.to_string(), table)],
    )
}

pub fn assign_year_values(
    reference: ReferenceTable,
    year_column: &str,
    model_year: i64,
    values: &[(String, f64)],
) -> SynthesisResult<CsvTable> {
    let ReferenceTable { path, mut table } = reference;

    let years = numeric_column(&table, &path, year_column)?.to_vec();
    for (name, _) in values {
        numeric_column(&table, &path, name)?;
    }

    let model_year = model_year as f64;
    for (name, assigned) in values {
        let Some(column) = table.column_mut(name) else {
            continue;
        };
        let kind = column.kind();
        let Some(cells) = column.numeric_mut() else {
            continue;
        };
        for (cell, year) in cells.iter_mut().zip(&years) {
            if *year == Some(model_year) {
                *cell = Some(*assigned);
            }
        }
        if kind == ColumnKind::Integer && assigned.fract() != 0.0 {
            column.set_numeric_kind(ColumnKind::Float);
        }
    }
    Ok(table)
}
