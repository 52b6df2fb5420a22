//! # bulkprint
//!
//! Explode a BulkPrint PDF export into a table of candidates and one resume
//! document per candidate.
//!
//! A BulkPrint export concatenates, for every applicant, a rendered
//! "Candidate Details" page followed by the applicant's uploaded resume. Its
//! top-level bookmarks mark where each part starts:
//!
//! - `"<n>. Candidate Details"` starts a details page
//! - `"<file>.pdf"` starts a resume that was merged successfully
//! - `"<file>.pdf (<status>)"` marks a resume BulkPrint could not merge
//!
//! ## Features
//!
//! - **Outline walking**: top-level bookmarks in export order, nested resume
//!   bookmarks skipped
//! - **Candidate parsing**: title, first and last name and email from the
//!   details page text
//! - **Resume extraction**: page ranges bounded by the next top-level
//!   bookmark, written as standalone PDFs
//! - **Sinks**: `candidates.csv` plus `resumes/<id>.pdf`, or in memory
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bulkprint::{pipeline, DirectorySink, ExplodeConfig};
//!
//! # fn main() -> bulkprint::Result<()> {
//! let config = ExplodeConfig {
//!     inputs: vec!["BulkPrint.pdf".into()],
//!     ..ExplodeConfig::default()
//! };
//! config.validate_inputs()?;
//! let layout = config.prepare_output()?;
//! let sink = DirectorySink::create(&layout.csv_path, &layout.resume_dir)?;
//!
//! let (_, stats) = pipeline::run(&config, sink)?;
//! println!("{} candidates, {} resumes", stats.candidates, stats.resumes);
//! # Ok(())
//! # }
//! ```

pub mod candidate;
pub mod classify;
pub mod config;
pub mod error;
pub mod outline;
pub mod pipeline;
pub mod segment;
pub mod sink;
pub mod source;

pub use candidate::{parse_candidate, CandidateRecord, TitleSet, DEFAULT_TITLES};
pub use classify::{classify, MarkerKind};
pub use config::{ExplodeConfig, LogLevel, LoggingConfig, OutputLayout};
pub use error::{BulkPrintError, Result};
pub use outline::{Bookmark, Outline, OutlineEntry};
pub use pipeline::{Exploder, RunState};
pub use segment::{plan_segment, ResumeSegment};
pub use sink::{DirectorySink, MemorySink, RecordSink, RunStats, StoredResume};
pub use source::{PagedDocument, PdfSource};

/// Current version of bulkprint
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
