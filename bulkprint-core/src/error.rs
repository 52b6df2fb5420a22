use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkPrintError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Could not create output directory {}: {source}", path.display())]
    OutputSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed outline: {0}")]
    MalformedOutline(String),

    #[error("Could not parse candidate {candidate_id}: {reason}")]
    CandidateParse {
        candidate_id: u32,
        reason: String,
        raw: String,
    },

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Invalid page number: {0}")]
    InvalidPageNumber(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BulkPrintError {
    /// Whether this error is confined to a single record and the run may continue.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            BulkPrintError::MalformedOutline(_)
                | BulkPrintError::CandidateParse { .. }
                | BulkPrintError::InvalidPageNumber(_)
                | BulkPrintError::Pdf(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BulkPrintError>;
