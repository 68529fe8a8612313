use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Missing required column: {field}")]
    MissingColumn { field: &'static str },

    #[error("Sheet has no data rows")]
    EmptySheet,

    #[error("No valid rows after filtering")]
    NoValidRows,

    #[error("Workbook could not be read: {0}")]
    UnreadableWorkbook(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
