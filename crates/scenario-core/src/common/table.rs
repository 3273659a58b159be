//! In-memory model of a scenario CSV file.
//!
//! Columns are typed when a file is loaded: `Integer` when every cell is
//! present and integral, `Float` when every present cell is numeric, `Text`
//! otherwise. An integral column with a gap is therefore `Float`, and a
//! column with no rows at all is `Text`.

use crate::domain::{SynthesisError, SynthesisResult};
use crate::modules::serialization::{format_float_cell, format_integer_cell, write_binary_artifact};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Token written for missing cells.
pub const MISSING_TOKEN: &str = "NA";

const MISSING_INPUT_TOKENS: [&str; 10] = [
    "", "NA", "N/A", "NaN", "nan", "NULL", "null", "#N/A", "<NA>", "None",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: ColumnValues,
}

impl Column {
    pub fn integer(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Integer,
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Float,
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
            values: ColumnValues::Text(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Retypes a numeric column; text columns keep their kind.
    pub fn set_numeric_kind(&mut self, kind: ColumnKind) {
        if self.kind.is_numeric() && kind.is_numeric() {
            self.kind = kind;
        }
    }

    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(values) => values.len(),
            ColumnValues::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn numeric(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(values) => Some(values),
            ColumnValues::Text(_) => None,
        }
    }

    pub fn numeric_mut(&mut self) -> Option<&mut Vec<Option<f64>>> {
        match &mut self.values {
            ColumnValues::Numeric(values) => Some(values),
            ColumnValues::Text(_) => None,
        }
    }

    pub fn text_values(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::Numeric(_) => None,
            ColumnValues::Text(values) => Some(values),
        }
    }

    pub fn has_missing(&self) -> bool {
        match &self.values {
            ColumnValues::Numeric(values) => values.iter().any(Option::is_none),
            ColumnValues::Text(values) => values.iter().any(Option::is_none),
        }
    }

    fn render_cell(&self, row: usize) -> String {
        match &self.values {
            ColumnValues::Numeric(values) => match values[row] {
                None => MISSING_TOKEN.to_string(),
                Some(value) if self.kind == ColumnKind::Integer => format_integer_cell(value),
                Some(value) => format_float_cell(value),
            },
            ColumnValues::Text(values) => values[row]
                .clone()
                .unwrap_or_else(|| MISSING_TOKEN.to_string()),
        }
    }

    fn from_raw(name: String, raw: Vec<Option<String>>) -> Self {
        match classify(&raw) {
            ColumnKind::Text => Self::text(name, raw),
            kind => {
                let values = raw
                    .iter()
                    .map(|cell| {
                        cell.as_deref()
                            .and_then(|text| text.trim().parse::<f64>().ok())
                    })
                    .collect();
                Self {
                    name,
                    kind,
                    values: ColumnValues::Numeric(values),
                }
            }
        }
    }
}

fn classify(raw: &[Option<String>]) -> ColumnKind {
    if raw.is_empty() {
        return ColumnKind::Text;
    }

    let all_present = raw.iter().all(Option::is_some);
    if all_present
        && raw
            .iter()
            .flatten()
            .all(|cell| cell.trim().parse::<i64>().is_ok())
    {
        return ColumnKind::Integer;
    }

    if raw
        .iter()
        .flatten()
        .all(|cell| cell.trim().parse::<f64>().is_ok())
    {
        return ColumnKind::Float;
    }

    ColumnKind::Text
}

fn is_missing_token(cell: &str) -> bool {
    let trimmed = cell.trim();
    MISSING_INPUT_TOKENS.contains(&trimmed)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl CsvTable {
    /// Builds a table from equal-length columns.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map_or(0, Column::len);
        debug_assert!(columns.iter().all(|column| column.len() == row_count));
        Self { columns, row_count }
    }

    pub fn read(path: &Path) -> SynthesisResult<Self> {
        let file = File::open(path).map_err(|source| SynthesisError::io(path, source))?;
        Self::parse(path, file)
    }

    /// Parses CSV content; `path` only labels errors.
    pub fn parse(path: &Path, reader: impl Read) -> SynthesisResult<Self> {
        let csv_error = |source| SynthesisError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .enumerate()
            .map(|(index, header)| {
                if index == 0 {
                    header.trim_start_matches('\u{feff}').to_string()
                } else {
                    header.to_string()
                }
            })
            .collect();

        let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            for (column, cell) in raw_columns.iter_mut().zip(record.iter()) {
                column.push((!is_missing_token(cell)).then(|| cell.to_string()));
            }
        }

        let row_count = raw_columns.first().map_or(0, Vec::len);
        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, raw)| Column::from_raw(name, raw))
            .collect();
        Ok(Self { columns, row_count })
    }

    /// CSV bytes as written to disk: `\n` terminators, minimal quoting.
    pub fn to_csv_bytes(&self) -> csv::Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(self.columns.iter().map(Column::name))?;
        for row in 0..self.row_count {
            writer.write_record(self.columns.iter().map(|column| column.render_cell(row)))?;
        }
        writer
            .into_inner()
            .map_err(|error| csv::Error::from(error.into_error()))
    }

    pub fn to_csv_string(&self) -> String {
        // An in-memory writer only fails on allocation failure.
        let bytes = self.to_csv_bytes().unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn write(&self, path: &Path) -> SynthesisResult<()> {
        let bytes = self.to_csv_bytes().map_err(|source| SynthesisError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        write_binary_artifact(path, &bytes).map_err(|source| SynthesisError::io(path, source))
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.name == name)
    }

    /// Names of the columns of `kind`, in file order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| column.kind == kind)
            .map(|column| column.name.clone())
            .collect()
    }

    pub fn has_missing(&self) -> bool {
        self.columns.iter().any(Column::has_missing)
    }

    /// Replaces missing numeric cells with `value`; text gaps stay missing.
    pub fn fill_missing(&mut self, value: f64) {
        for column in &mut self.columns {
            if let Some(values) = column.numeric_mut() {
                for cell in values.iter_mut().filter(|cell| cell.is_none()) {
                    *cell = Some(value);
                }
            }
        }
    }

    /// Turns every numeric zero back into a missing cell.
    ///
    /// Integer columns that gain a gap become `Float`, matching the load-time
    /// classification of a column with gaps.
    pub fn restore_missing_zeros(&mut self) {
        for column in &mut self.columns {
            let Some(values) = column.numeric_mut() else {
                continue;
            };
            let mut restored = false;
            for cell in values.iter_mut() {
                if *cell == Some(0.0) {
                    *cell = None;
                    restored = true;
                }
            }
            if restored && column.kind == ColumnKind::Integer {
                column.kind = ColumnKind::Float;
            }
        }
    }
}
