//! Output of candidate rows, resume documents and run statistics

use crate::candidate::CandidateRecord;
use crate::error::{BulkPrintError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Column header of the candidates table
pub const CSV_HEADER: [&str; 5] = ["id", "title", "first_name", "last_name", "email"];

/// Extension of extracted resume files
pub const RESUME_EXTENSION: &str = "pdf";

/// Destination for records produced by the explode pipeline
pub trait RecordSink {
    /// Append one candidate row
    fn write_candidate(&mut self, record: &CandidateRecord) -> Result<()>;

    /// Store the extracted resume document of a candidate
    fn write_resume(&mut self, candidate_id: u32, document: &[u8]) -> Result<()>;

    /// Flush anything still buffered
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes `candidates.csv` and `resumes/<id>.pdf` under an output directory
pub struct DirectorySink {
    csv: csv::Writer<File>,
    csv_path: PathBuf,
    resume_dir: PathBuf,
    resumes_per_id: HashMap<u32, usize>,
}

impl DirectorySink {
    /// Create the CSV file (header included) inside an existing directory layout
    pub fn create(csv_path: impl Into<PathBuf>, resume_dir: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();
        let resume_dir = resume_dir.into();
        if !resume_dir.is_dir() {
            return Err(BulkPrintError::OutputSetup {
                path: resume_dir,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "directory missing"),
            });
        }

        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&csv_path)?;
        csv.write_record(CSV_HEADER)?;
        csv.flush()?;

        Ok(Self {
            csv,
            csv_path,
            resume_dir,
            resumes_per_id: HashMap::new(),
        })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn resume_dir(&self) -> &Path {
        &self.resume_dir
    }

    /// File name for a candidate's resume; repeats get a numeric suffix
    fn resume_path(&mut self, candidate_id: u32) -> PathBuf {
        let count = self.resumes_per_id.entry(candidate_id).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            format!("{candidate_id}.{RESUME_EXTENSION}")
        } else {
            warn!(
                candidate_id,
                occurrence = *count,
                "candidate already has a resume, writing an additional file"
            );
            format!("{candidate_id}_{count}.{RESUME_EXTENSION}")
        };
        self.resume_dir.join(name)
    }
}

impl RecordSink for DirectorySink {
    fn write_candidate(&mut self, record: &CandidateRecord) -> Result<()> {
        self.csv.serialize(record)?;
        self.csv.flush()?;
        Ok(())
    }

    fn write_resume(&mut self, candidate_id: u32, document: &[u8]) -> Result<()> {
        let path = self.resume_path(candidate_id);
        fs::write(&path, document)?;
        debug!(path = %path.display(), bytes = document.len(), "wrote resume");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.csv.flush()?;
        Ok(())
    }
}

/// A resume held by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResume {
    pub candidate_id: u32,
    pub size: usize,
    /// Empty when the sink only tracks sizes
    pub document: Vec<u8>,
}

/// Keeps records in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySink {
    pub candidates: Vec<CandidateRecord>,
    pub resumes: Vec<StoredResume>,
    discard_documents: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record resume sizes only, dropping the document bytes
    pub fn sizes_only() -> Self {
        Self {
            discard_documents: true,
            ..Self::default()
        }
    }

    pub fn resume_for(&self, candidate_id: u32) -> Option<&StoredResume> {
        self.resumes
            .iter()
            .find(|resume| resume.candidate_id == candidate_id)
    }
}

impl RecordSink for MemorySink {
    fn write_candidate(&mut self, record: &CandidateRecord) -> Result<()> {
        self.candidates.push(record.clone());
        Ok(())
    }

    fn write_resume(&mut self, candidate_id: u32, document: &[u8]) -> Result<()> {
        self.resumes.push(StoredResume {
            candidate_id,
            size: document.len(),
            document: if self.discard_documents {
                Vec::new()
            } else {
                document.to_vec()
            },
        });
        Ok(())
    }
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Input documents processed
    pub documents: usize,
    /// Candidate details markers seen (highest assigned id)
    pub candidates: u32,
    /// Resumes extracted and written
    pub resumes: usize,
    /// Resume markers carrying an error/pending status
    pub resume_errors: usize,
    /// Ids of candidates whose details page could not be parsed
    pub candidate_failures: Vec<u32>,
    /// Resume markers whose page range could not be extracted
    pub segment_failures: usize,
    /// Resume markers seen before any candidate
    pub orphan_resumes: usize,
    /// Top-level bookmarks matching no marker shape
    pub unrecognized: usize,
}

impl RunStats {
    /// Whether any record was skipped or flagged
    pub fn has_failures(&self) -> bool {
        !self.candidate_failures.is_empty() || self.segment_failures > 0 || self.orphan_resumes > 0
    }
}
