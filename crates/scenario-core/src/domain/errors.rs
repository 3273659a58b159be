use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type ScenarioResult<T> = Result<T, ScenarioError>;
pub type SynthesisResult<T> = Result<T, SynthesisError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl ScenarioErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Experiment-level error surfaced to the orchestration caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioError {
    category: ScenarioErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl ScenarioError {
    pub fn new(
        category: ScenarioErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            ScenarioErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ScenarioErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ScenarioErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ScenarioErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> ScenarioErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}

impl Display for ScenarioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for ScenarioError {}

/// Failure of a single transformation family.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("reference file '{}' has no counterpart in the paired set", path.display())]
    MissingReferenceFile { path: PathBuf },
    #[error("family '{family}' has no reference set for category '{category}' at '{}'", path.display())]
    MissingCategory {
        family: String,
        category: String,
        path: PathBuf,
    },
    #[error("reference file name '{}' is not valid UTF-8", path.display())]
    InvalidFileName { path: PathBuf },
    #[error("column '{column}' is missing from '{}'", path.display())]
    ColumnMismatch { path: PathBuf, column: String },
    #[error("'{}' has {found} rows, expected {expected}", path.display())]
    ShapeMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    #[error("family '{family}' requires parameter '{parameter}'")]
    MissingParameter { family: String, parameter: String },
    #[error("parameter '{parameter}' has unusable value '{value}'")]
    InvalidParameter { parameter: String, value: String },
    #[error("i/o failure on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed csv in '{}': {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },
}

impl SynthesisError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub const fn category(&self) -> ScenarioErrorCategory {
        match self {
            Self::MissingReferenceFile { .. }
            | Self::MissingCategory { .. }
            | Self::InvalidFileName { .. }
            | Self::ColumnMismatch { .. }
            | Self::ShapeMismatch { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::Csv { .. }
            | Self::Pattern { .. } => ScenarioErrorCategory::InputValidationError,
            Self::Io { .. } => ScenarioErrorCategory::IoSystemError,
        }
    }

    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::MissingReferenceFile { .. } => "INPUT.MISSING_REFERENCE_FILE",
            Self::MissingCategory { .. } => "INPUT.MISSING_CATEGORY",
            Self::InvalidFileName { .. } => "INPUT.FILE_NAME",
            Self::ColumnMismatch { .. } => "INPUT.COLUMN_MISMATCH",
            Self::ShapeMismatch { .. } => "INPUT.SHAPE_MISMATCH",
            Self::MissingParameter { .. } => "INPUT.MISSING_PARAMETER",
            Self::InvalidParameter { .. } => "INPUT.INVALID_PARAMETER",
            Self::Io { .. } => "IO.REFERENCE_SET",
            Self::Csv { .. } => "INPUT.CSV_FORMAT",
            Self::Pattern { .. } => "INPUT.FILE_PATTERN",
        }
    }
}

impl From<&SynthesisError> for ScenarioError {
    fn from(error: &SynthesisError) -> Self {
        ScenarioError::new(error.category(), error.placeholder(), error.to_string())
    }
}

impl From<SynthesisError> for ScenarioError {
    fn from(error: SynthesisError) -> Self {
        ScenarioError::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::{ScenarioError, ScenarioErrorCategory, SynthesisError};
    use std::path::PathBuf;

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (ScenarioErrorCategory::InputValidationError, 2),
            (ScenarioErrorCategory::IoSystemError, 3),
            (ScenarioErrorCategory::ComputationError, 4),
            (ScenarioErrorCategory::InternalError, 5),
        ];

        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_line() {
        let error = ScenarioError::input_validation(
            "INPUT.MISSING_CATEGORY",
            "family 'HHPOP' has no reference set for category '3'",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.MISSING_CATEGORY] family 'HHPOP' has no reference set for category '3'"
        );
    }

    #[test]
    fn synthesis_errors_map_onto_scenario_categories() {
        let missing = SynthesisError::MissingReferenceFile {
            path: PathBuf::from("lu/2/marea_mix.csv"),
        };
        let converted = ScenarioError::from(&missing);
        assert_eq!(converted.category(), ScenarioErrorCategory::InputValidationError);
        assert_eq!(converted.placeholder(), "INPUT.MISSING_REFERENCE_FILE");
        assert!(converted.message().contains("lu/2/marea_mix.csv"));

        let io = SynthesisError::io(
            "inputs",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(ScenarioError::from(io).exit_code(), 3);
    }
}
