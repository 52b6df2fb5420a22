//! Resume page-range segmentation
//!
//! A resume runs from its own bookmark's page up to, but not including, the
//! page of the next top-level bookmark. When the resume is the last top-level
//! entry it runs to the end of the document.

use crate::error::{BulkPrintError, Result};
use crate::outline::{Outline, OutlineEntry};
use std::ops::Range;

/// Half-open page range holding one candidate's resume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeSegment {
    /// Candidate the resume is filed under
    pub candidate_id: u32,
    /// Pages `[start, end)`, 0-based
    pub pages: Range<usize>,
}

impl ResumeSegment {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Compute the page range of the resume whose marker sits at `position`.
///
/// The segment is bound to `candidate_id` as given; the caller passes the
/// id current when the marker was encountered, whichever order the resume
/// and its details page appear in.
pub fn plan_segment(
    outline: &Outline,
    position: usize,
    page_count: usize,
    candidate_id: u32,
) -> Result<ResumeSegment> {
    let marker = match outline.entries().get(position) {
        Some(OutlineEntry::Bookmark(marker)) => marker,
        _ => {
            return Err(BulkPrintError::MalformedOutline(format!(
                "no top-level bookmark at position {position}"
            )))
        }
    };

    let start = marker.page.ok_or_else(|| {
        BulkPrintError::MalformedOutline(format!(
            "cannot resolve page of resume bookmark '{}'",
            marker.title
        ))
    })?;

    let end = match outline.next_top_level(position) {
        Some((_, next)) => next.page.ok_or_else(|| {
            BulkPrintError::MalformedOutline(format!(
                "cannot resolve page of bookmark '{}' following resume '{}'",
                next.title, marker.title
            ))
        })?,
        None => page_count,
    };

    if end > page_count {
        return Err(BulkPrintError::MalformedOutline(format!(
            "resume '{}' ends at page {end} beyond document length {page_count}",
            marker.title
        )));
    }
    if end <= start {
        return Err(BulkPrintError::MalformedOutline(format!(
            "resume '{}' has empty page range [{start}, {end})",
            marker.title
        )));
    }

    Ok(ResumeSegment {
        candidate_id,
        pages: start..end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Bookmark;

    #[test]
    fn test_range_ends_at_next_top_level() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("3. Candidate Details", 10),
            Bookmark::new("resume.pdf", 10),
            Bookmark::new("4. Candidate Details", 13),
        ]);
        let segment = plan_segment(&outline, 1, 20, 3).unwrap();
        assert_eq!(segment.pages, 10..13);
        assert_eq!(segment.candidate_id, 3);
        assert_eq!(segment.page_count(), 3);
    }

    #[test]
    fn test_nested_bookmarks_do_not_end_range() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("resume.pdf", 2)
                .with_child(Bookmark::new("Skills", 3))
                .with_child(Bookmark::new("References", 4)),
            Bookmark::new("2. Candidate Details", 6),
        ]);
        let segment = plan_segment(&outline, 0, 10, 1).unwrap();
        assert_eq!(segment.pages, 2..6);
    }

    #[test]
    fn test_last_resume_extends_to_end() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("1. Candidate Details", 0),
            Bookmark::new("resume.pdf", 1).with_child(Bookmark::new("Page 2", 2)),
        ]);
        let segment = plan_segment(&outline, 1, 5, 1).unwrap();
        assert_eq!(segment.pages, 1..5);
    }

    #[test]
    fn test_resume_before_details_binds_given_id() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("resume.pdf", 0),
            Bookmark::new("1. Candidate Details", 2),
        ]);
        let segment = plan_segment(&outline, 0, 3, 4).unwrap();
        assert_eq!(segment.candidate_id, 4);
        assert_eq!(segment.pages, 0..2);
    }

    #[test]
    fn test_unresolved_start_is_malformed() {
        let outline = Outline::from_forest(vec![
            Bookmark::unresolved("resume.pdf"),
            Bookmark::new("2. Candidate Details", 6),
        ]);
        let err = plan_segment(&outline, 0, 10, 1).unwrap_err();
        assert!(matches!(err, BulkPrintError::MalformedOutline(_)));
    }

    #[test]
    fn test_unresolved_end_is_malformed() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("resume.pdf", 1),
            Bookmark::unresolved("2. Candidate Details"),
        ]);
        let err = plan_segment(&outline, 0, 10, 1).unwrap_err();
        assert!(err.to_string().contains("2. Candidate Details"));
    }

    #[test]
    fn test_empty_and_inverted_ranges() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("resume.pdf", 4),
            Bookmark::new("2. Candidate Details", 4),
            Bookmark::new("other.pdf", 5),
            Bookmark::new("3. Candidate Details", 3),
        ]);
        assert!(plan_segment(&outline, 0, 10, 1).is_err());
        assert!(plan_segment(&outline, 2, 10, 2).is_err());
    }

    #[test]
    fn test_range_beyond_document() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("resume.pdf", 1),
            Bookmark::new("2. Candidate Details", 12),
        ]);
        assert!(plan_segment(&outline, 0, 10, 1).is_err());
    }

    #[test]
    fn test_position_must_be_top_level() {
        let outline = Outline::from_forest(vec![
            Bookmark::new("resume.pdf", 1).with_child(Bookmark::new("inner.pdf", 2)),
        ]);
        assert!(plan_segment(&outline, 1, 5, 1).is_err());
        assert!(plan_segment(&outline, 7, 5, 1).is_err());
    }
}
