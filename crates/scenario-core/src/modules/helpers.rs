use crate::common::table::{ColumnKind, CsvTable};
use crate::domain::{SynthesisError, SynthesisResult, WorkingArtifact};
use crate::numerics::round_integer;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// Sub-keys of a two-point reference family.
pub const FIRST_REFERENCE_SET: &str = "1";
pub const SECOND_REFERENCE_SET: &str = "2";

/// Names of the regular files in `dir`, sorted, optionally filtered by globs.
pub fn list_reference_files(dir: &Path, patterns: &[String]) -> SynthesisResult<Vec<String>> {
    let filter = file_filter(patterns)?;
    let entries = fs::read_dir(dir).map_err(|source| SynthesisError::io(dir, source))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SynthesisError::io(dir, source))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| SynthesisError::InvalidFileName { path: entry.path() })?;
        if filter.as_ref().is_none_or(|set| set.is_match(&name)) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn file_filter(patterns: &[String]) -> SynthesisResult<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| SynthesisError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|source| SynthesisError::Pattern {
            pattern: patterns.join(","),
            source,
        })
}

/// Files of set "1", each confirmed to exist in set "2" before anything is read.
pub fn paired_reference_files(
    first_dir: &Path,
    second_dir: &Path,
    patterns: &[String],
) -> SynthesisResult<Vec<String>> {
    let names = list_reference_files(first_dir, patterns)?;
    for name in &names {
        let counterpart = second_dir.join(name);
        if !counterpart.is_file() {
            return Err(SynthesisError::MissingReferenceFile { path: counterpart });
        }
    }
    Ok(names)
}

/// Writes computed tables into `model_dir/target`, creating it as needed.
pub fn write_tables(
    model_dir: &Path,
    target: &Path,
    tables: &[(String, CsvTable)],
) -> SynthesisResult<Vec<WorkingArtifact>> {
    let target_dir = ensure_target_dir(model_dir, target)?;
    let mut artifacts = Vec::with_capacity(tables.len());
    for (name, table) in tables {
        let path = target_dir.join(name);
        table.write(&path)?;
        tracing::debug!(path = %path.display(), rows = table.row_count(), "wrote working input");
        artifacts.push(WorkingArtifact::new(target.join(name)));
    }
    Ok(artifacts)
}

pub fn ensure_target_dir(model_dir: &Path, target: &Path) -> SynthesisResult<PathBuf> {
    let target_dir = model_dir.join(target);
    fs::create_dir_all(&target_dir).map_err(|source| SynthesisError::io(&target_dir, source))?;
    Ok(target_dir)
}

/// Values of a numeric column, or the mismatch naming it.
pub fn numeric_column<'t>(
    table: &'t CsvTable,
    path: &Path,
    name: &str,
) -> SynthesisResult<&'t [Option<f64>]> {
    table
        .column(name)
        .and_then(|column| column.numeric())
        .ok_or_else(|| SynthesisError::ColumnMismatch {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

/// Columns taking part in a blend, split by arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnSelection {
    pub float: Vec<String>,
    pub integer: Vec<String>,
}

impl ColumnSelection {
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.float.retain(|name| keep(name));
        self.integer.retain(|name| keep(name));
    }
}

/// Partitions `table`'s numeric columns, leaving out `excluded`.
///
/// With `integers_as_float` every integer column joins the float partition
/// and the integer partition stays empty.
pub fn partition_columns(
    table: &CsvTable,
    excluded: &[String],
    integers_as_float: bool,
) -> ColumnSelection {
    let mut float = table.columns_of_kind(ColumnKind::Float);
    let mut integer = table.columns_of_kind(ColumnKind::Integer);
    if integers_as_float {
        float.append(&mut integer);
    }

    let mut selection = ColumnSelection { float, integer };
    selection.retain(|name| !excluded.iter().any(|column| column == name));
    selection
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Gaps count as zero; when either table had a gap, zeros become gaps again.
    ZeroFillRestore,
    /// A gap on either side leaves a gap in that cell.
    Propagate,
}

/// One reference table with the path it was loaded from.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    pub path: PathBuf,
    pub table: CsvTable,
}

impl ReferenceTable {
    pub fn load(path: PathBuf) -> SynthesisResult<Self> {
        let table = CsvTable::read(&path)?;
        Ok(Self { path, table })
    }
}

/// Combines `second` into `first` cell by cell over `selection`.
///
/// `rule(column, a, b)` gives the float result; integer columns round it.
/// Columns outside the selection keep `first`'s values.
pub fn combine_pair(
    first: ReferenceTable,
    second: ReferenceTable,
    selection: &ColumnSelection,
    policy: MissingPolicy,
    rule: impl Fn(&str, f64, f64) -> f64,
) -> SynthesisResult<CsvTable> {
    let ReferenceTable {
        path: _,
        table: mut output,
    } = first;
    let ReferenceTable {
        path: second_path,
        table: mut second,
    } = second;

    if second.row_count() != output.row_count() {
        return Err(SynthesisError::ShapeMismatch {
            path: second_path,
            expected: output.row_count(),
            found: second.row_count(),
        });
    }

    for name in selection.float.iter().chain(&selection.integer) {
        let numeric = second
            .column(name)
            .is_some_and(|column| column.kind().is_numeric());
        if !numeric {
            return Err(SynthesisError::ColumnMismatch {
                path: second_path,
                column: name.clone(),
            });
        }
    }

    let restore = policy == MissingPolicy::ZeroFillRestore
        && (output.has_missing() || second.has_missing());
    if policy == MissingPolicy::ZeroFillRestore {
        output.fill_missing(0.0);
        second.fill_missing(0.0);
    }

    let partitions = [
        (&selection.float, ColumnKind::Float),
        (&selection.integer, ColumnKind::Integer),
    ];
    for (names, kind) in partitions {
        for name in names {
            let Some(counterpart) = second.column(name).and_then(|column| column.numeric())
            else {
                continue;
            };
            let Some(column) = output.column_mut(name) else {
                continue;
            };
            let Some(values) = column.numeric_mut() else {
                continue;
            };

            let mut has_gap = false;
            for (cell, other) in values.iter_mut().zip(counterpart) {
                *cell = match (*cell, *other) {
                    (Some(a), Some(b)) => {
                        let combined = rule(name.as_str(), a, b);
                        Some(if kind == ColumnKind::Integer {
                            round_integer(combined)
                        } else {
                            combined
                        })
                    }
                    _ => None,
                };
                has_gap |= cell.is_none();
            }

            column.set_numeric_kind(if has_gap { ColumnKind::Float } else { kind });
        }
    }

    if restore {
        output.restore_missing_zeros();
    }
    Ok(output)
}
