//! Error types for the summary pipeline

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Normalize,
    Join,
    Coerce,
    Serialize,
}

impl Stage {
    /// Operator-facing message printed when a run fails in this stage.
    pub fn failure_message(self) -> &'static str {
        match self {
            Stage::Load => "Failed to load the input data",
            Stage::Normalize => "Missing or malformed columns in the viewing data",
            Stage::Join => "Failed to match viewing data with producers",
            Stage::Coerce => "Failed to convert the summary to its output types",
            Stage::Serialize => "Failed to save the summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Join => "join",
            Stage::Coerce => "coerce",
            Stage::Serialize => "serialize",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input container does not exist
    #[error("input not found: {}", path.display())]
    DataSourceNotFound { path: PathBuf },

    /// The input exists but could not be read (bad container, missing sheet)
    #[error("cannot read {}: {reason}", path.display())]
    DataSourceUnreadable { path: PathBuf, reason: String },

    /// A required column is absent
    #[error("column '{column}' is missing from the {table} table")]
    SchemaMismatch {
        stage: Stage,
        table: String,
        column: String,
    },

    /// A value cannot be cast to its required type
    #[error("cannot convert {column} value '{value}' in {table} row {row} to {target}")]
    TypeCoercion {
        stage: Stage,
        table: String,
        row: usize,
        column: String,
        value: String,
        target: &'static str,
    },

    /// The output destination cannot be written
    #[error("cannot write {}: {source}", path.display())]
    SinkUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::DataSourceNotFound { .. } | PipelineError::DataSourceUnreadable { .. } => {
                Stage::Load
            }
            PipelineError::SchemaMismatch { stage, .. } | PipelineError::TypeCoercion { stage, .. } => {
                *stage
            }
            PipelineError::SinkUnwritable { .. } => Stage::Serialize,
        }
    }

    pub(crate) fn missing_column(stage: Stage, table: &str, column: &str) -> Self {
        PipelineError::SchemaMismatch {
            stage,
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
