//! Classification of top-level bookmark titles
//!
//! BulkPrint labels each top-level bookmark with one of three shapes:
//!
//! - `"<n>. Candidate Details"` starts a candidate's detail page
//! - `"<file>.pdf"` starts an attached resume
//! - `"<file>.pdf (<status>)"` marks a resume the export failed to embed,
//!   e.g. `(Error)`, `(Pending)` or `(Embedded)`
//!
//! Checks run in a fixed precedence: error suffix, then bare resume, then
//! candidate details. A title therefore maps to exactly one [`MarkerKind`].

use std::fmt;

const DETAILS_SUFFIX: &str = " Candidate Details";
const RESUME_EXTENSION: &str = ".pdf";
const STATUS_OPEN: &str = ".pdf (";

/// Meaning of a top-level bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Start of a candidate's detail page
    CandidateDetails,
    /// Start of a resume that was exported successfully
    ResumeOk,
    /// Resume placeholder carrying a status suffix
    ResumeError,
    /// Anything else
    Unrecognized,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::CandidateDetails => "candidate-details",
            MarkerKind::ResumeOk => "resume",
            MarkerKind::ResumeError => "resume-error",
            MarkerKind::Unrecognized => "unrecognized",
        }
    }

    /// Whether the marker refers to a resume, successful or not
    pub fn is_resume(&self) -> bool {
        matches!(self, MarkerKind::ResumeOk | MarkerKind::ResumeError)
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a bookmark title
pub fn classify(title: &str) -> MarkerKind {
    let title = title.trim_end();

    if has_status_suffix(title) {
        MarkerKind::ResumeError
    } else if title.ends_with(RESUME_EXTENSION) {
        MarkerKind::ResumeOk
    } else if title.ends_with(DETAILS_SUFFIX) {
        MarkerKind::CandidateDetails
    } else {
        MarkerKind::Unrecognized
    }
}

/// `true` for `"<anything>.pdf (<anything>)"`
fn has_status_suffix(title: &str) -> bool {
    title.ends_with(')') && title.contains(STATUS_OPEN)
}
