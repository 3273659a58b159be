use super::helpers::{ReferenceTable, numeric_column, write_tables};
use super::traits::FamilyRequest;
use crate::common::table::{ColumnKind, CsvTable};
use crate::domain::{SynthesisResult, WorkingArtifact};
use crate::numerics::compound_factor;

/// Column layout of a single-template family.
#[derive(Debug, Clone, Copy)]
pub struct TemplateColumns<'a> {
    pub file: &'a str,
    pub year_column: &'a str,
}

/// Compounds `columns` of the template by `rate^(year - base_year)` per row.
pub fn apply_growth(
    request: &FamilyRequest<'_>,
    parameter: &str,
    template: TemplateColumns<'_>,
    columns: &[String],
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let rate = request.number(parameter)?;
    let reference = ReferenceTable::load(request.reference_dir.join(template.file))?;
    let table = compound_table(
        reference,
        template.year_column,
        columns,
        rate,
        request.years.base_year,
    )?;

    tracing::info!(
        family = request.family,
        parameter,
        rate,
        base_year = request.years.base_year,
        "growth compound"
    );
    write_tables(
        request.model_dir,
        request.target,
        &[(template.file.to_string(), table)],
    )
}

pub fn compound_table(
    reference: ReferenceTable,
    year_column: &str,
    columns: &[String],
    rate: f64,
    base_year: i64,
) -> SynthesisResult<CsvTable> {
    let ReferenceTable { path, mut table } = reference;

    let years = numeric_column(&table, &path, year_column)?.to_vec();
    for name in columns {
        numeric_column(&table, &path, name)?;
    }

    for name in columns {
        let Some(column) = table.column_mut(name) else {
            continue;
        };
        if let Some(values) = column.numeric_mut() {
            for (value, year) in values.iter_mut().zip(&years) {
                let (Some(cell), Some(year)) = (value.as_mut(), year) else {
                    continue;
                };
                *cell *= compound_factor(rate, (*year as i64).saturating_sub(base_year));
            }
        }
        column.set_numeric_kind(ColumnKind::Float);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::{TemplateColumns, apply_growth, compound_table};
    use crate::common::table::CsvTable;
    use crate::domain::{ModelYears, ParameterDictionary, SynthesisError};
    use crate::modules::helpers::ReferenceTable;
    use crate::modules::traits::FamilyRequest;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const INCOME: &str = "Geo,Year,HHIncomePC.2005,GQIncomePC.2005\n\
                          RVMPO,2010,30000,10000\n\
                          RVMPO,2012,30000,NA\n";

    fn reference(content: &str) -> ReferenceTable {
        ReferenceTable {
            path: PathBuf::from("azone_per_cap_inc.csv"),
            table: CsvTable::parse(Path::new("azone_per_cap_inc.csv"), content.as_bytes())
                .expect("csv should parse"),
        }
    }

    fn income_columns() -> Vec<String> {
        vec!["HHIncomePC.2005".to_string(), "GQIncomePC.2005".to_string()]
    }

    #[test]
    fn growth_compounds_from_the_base_year() {
        let output = compound_table(reference(INCOME), "Year", &income_columns(), 1.1, 2010)
            .expect("growth should succeed");

        assert_eq!(
            output.to_csv_string(),
            "Geo,Year,HHIncomePC.2005,GQIncomePC.2005\n\
             RVMPO,2010,30000.00000,10000.00000\n\
             RVMPO,2012,36300.00000,NA\n"
        );
    }

    #[test]
    fn year_and_target_columns_must_be_numeric() {
        let error = compound_table(reference(INCOME), "Geo", &income_columns(), 1.1, 2010)
            .expect_err("Geo is text");
        assert!(matches!(
            error,
            SynthesisError::ColumnMismatch { ref column, .. } if column == "Geo"
        ));

        let error = compound_table(
            reference(INCOME),
            "Year",
            &["Missing".to_string()],
            1.1,
            2010,
        )
        .expect_err("column is absent");
        assert!(matches!(error, SynthesisError::ColumnMismatch { .. }));
    }

    #[test]
    fn extreme_years_do_not_overflow_the_offset() {
        let content = "Geo,Year,HHIncomePC.2005,GQIncomePC.2005\n\
                       RVMPO,-1e19,30000,10000\n";
        let output = compound_table(reference(content), "Year", &income_columns(), 1.0, 2010)
            .expect("growth should succeed");

        let values = output
            .column("HHIncomePC.2005")
            .and_then(|column| column.numeric())
            .expect("numeric column");
        assert_eq!(values, &[Some(30000.0)]);
    }

    #[test]
    fn apply_growth_reads_the_template_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let reference_dir = temp.path().join("income");
        let model_dir = temp.path().join("model");
        fs::create_dir_all(&reference_dir).expect("reference dir");
        fs::write(reference_dir.join("azone_per_cap_inc.csv"), INCOME).expect("template");

        let mut params = ParameterDictionary::new();
        params.insert("INCOMEGROWTHRATE", 1.0);
        let request = FamilyRequest {
            family: "income",
            params: &params,
            reference_dir: &reference_dir,
            model_dir: &model_dir,
            target: Path::new("inputs"),
            file_patterns: &[],
            years: ModelYears {
                base_year: 2010,
                model_year: 2040,
            },
        };

        let artifacts = apply_growth(
            &request,
            "INCOMEGROWTHRATE",
            TemplateColumns {
                file: "azone_per_cap_inc.csv",
                year_column: "Year",
            },
            &income_columns(),
        )
        .expect("growth should succeed");

        assert_eq!(artifacts.len(), 1);
        let written = fs::read_to_string(model_dir.join("inputs/azone_per_cap_inc.csv"))
            .expect("output readable");
        assert!(written.contains("RVMPO,2012,30000.00000,NA"));
    }
}
