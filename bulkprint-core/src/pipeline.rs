//! The explode pass
//!
//! One forward walk over the top-level bookmarks of each document. Details
//! markers advance the candidate counter and produce a row; resume markers
//! produce a page-range extract filed under whichever candidate is current.
//! BulkPrint does not guarantee that a resume follows its own details page,
//! so no pairing beyond "current candidate" is attempted.

use crate::candidate::{parse_candidate, CandidateRecord, TitleSet};
use crate::classify::{classify, MarkerKind};
use crate::config::ExplodeConfig;
use crate::error::{BulkPrintError, Result};
use crate::outline::{Bookmark, Outline};
use crate::segment::plan_segment;
use crate::sink::{RecordSink, RunStats};
use crate::source::{PagedDocument, PdfSource};
use tracing::{debug, info, warn};

/// Mutable state carried across all documents of a run
#[derive(Debug, Default)]
pub struct RunState {
    current_candidate: u32,
    stats: RunStats,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the most recent details marker, 0 before the first one
    pub fn current_candidate(&self) -> u32 {
        self.current_candidate
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    fn next_candidate(&mut self) -> u32 {
        self.current_candidate += 1;
        self.stats.candidates = self.current_candidate;
        self.current_candidate
    }
}

/// Drives the explode pass over one or more documents into a sink
pub struct Exploder<S: RecordSink> {
    sink: S,
    titles: TitleSet,
    state: RunState,
}

impl<S: RecordSink> Exploder<S> {
    pub fn new(sink: S, titles: TitleSet) -> Self {
        Self {
            sink,
            titles,
            state: RunState::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Walk one document's outline and emit its candidates and resumes
    pub fn process_document<D: PagedDocument>(&mut self, name: &str, document: &D) -> Result<()> {
        let outline = document.outline()?;
        let page_count = document.page_count();
        self.state.stats.documents += 1;

        info!(
            document = name,
            pages = page_count,
            entries = outline.entries().len(),
            "processing document"
        );
        if outline.is_empty() {
            warn!(document = name, "document has no bookmarks");
        }

        for (position, bookmark) in outline.top_level() {
            let nested = outline.nested_after(position);
            if nested > 0 {
                debug!(title = %bookmark.title, nested, "skipping nested bookmarks");
            }

            match classify(&bookmark.title) {
                MarkerKind::CandidateDetails => self.on_candidate(document, bookmark)?,
                MarkerKind::ResumeOk => {
                    self.on_resume(document, &outline, position, bookmark, page_count)?
                }
                MarkerKind::ResumeError => {
                    self.state.stats.resume_errors += 1;
                    info!(
                        candidate_id = self.state.current_candidate,
                        title = %bookmark.title,
                        "resume has error status, skipping"
                    );
                }
                MarkerKind::Unrecognized => {
                    self.state.stats.unrecognized += 1;
                    debug!(title = %bookmark.title, position, "unrecognized bookmark");
                }
            }
        }

        Ok(())
    }

    fn on_candidate<D: PagedDocument>(&mut self, document: &D, bookmark: &Bookmark) -> Result<()> {
        let id = self.state.next_candidate();

        let parsed = bookmark
            .page
            .ok_or_else(|| {
                BulkPrintError::MalformedOutline(format!(
                    "cannot resolve page of '{}'",
                    bookmark.title
                ))
            })
            .and_then(|page| document.page_text(page))
            .and_then(|text| parse_candidate(id, &text, &self.titles));

        match parsed {
            Ok(record) => {
                info!(candidate_id = id, name = %record.full_name(), "found candidate");
                self.sink.write_candidate(&record)
            }
            Err(err) if err.is_per_record() => {
                warn!(candidate_id = id, error = %err, "flagging candidate");
                self.state.stats.candidate_failures.push(id);
                self.sink.write_candidate(&CandidateRecord::flagged(id))
            }
            Err(err) => Err(err),
        }
    }

    fn on_resume<D: PagedDocument>(
        &mut self,
        document: &D,
        outline: &Outline,
        position: usize,
        bookmark: &Bookmark,
        page_count: usize,
    ) -> Result<()> {
        let id = self.state.current_candidate;
        if id == 0 {
            warn!(title = %bookmark.title, "resume precedes every candidate, skipping");
            self.state.stats.orphan_resumes += 1;
            return Ok(());
        }

        let extracted = plan_segment(outline, position, page_count, id).and_then(|segment| {
            let bytes = document.extract_pages(segment.pages.clone())?;
            Ok((segment, bytes))
        });

        match extracted {
            Ok((segment, bytes)) => {
                self.sink.write_resume(id, &bytes)?;
                self.state.stats.resumes += 1;
                info!(
                    candidate_id = id,
                    start = segment.pages.start,
                    pages = segment.page_count(),
                    "found resume"
                );
                Ok(())
            }
            Err(err) if err.is_per_record() => {
                warn!(candidate_id = id, title = %bookmark.title, error = %err, "skipping resume");
                self.state.stats.segment_failures += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Flush the sink and hand it back with the run's statistics
    pub fn finish(mut self) -> Result<(S, RunStats)> {
        self.sink.finish()?;
        Ok((self.sink, self.state.stats))
    }
}

/// Process every configured input in order with a shared candidate counter.
///
/// Inputs and output directories are expected to be validated and created
/// beforehand; a missing input here still fails with `InputNotFound`.
pub fn run<S: RecordSink>(config: &ExplodeConfig, sink: S) -> Result<(S, RunStats)> {
    let mut exploder = Exploder::new(sink, config.titles.clone());

    for input in &config.inputs {
        let source = PdfSource::open(input)?;
        let name = input.display().to_string();
        exploder.process_document(&name, &source)?;
    }

    exploder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::source::memory::MemoryDocument;
    use pretty_assertions::assert_eq;

    fn details(name: &str, email: &str) -> String {
        format!("{name}\nEmail Address:\n{email}\n")
    }

    fn run_one(document: &MemoryDocument) -> (MemorySink, RunStats) {
        let mut exploder = Exploder::new(MemorySink::new(), TitleSet::default());
        exploder.process_document("test", document).unwrap();
        exploder.finish().unwrap()
    }

    fn resume_pages(sink: &MemorySink, candidate_id: u32) -> Vec<String> {
        MemoryDocument::decode_extract(&sink.resume_for(candidate_id).unwrap().document)
    }

    #[test]
    fn test_candidates_and_resumes() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page(details("Mr John Q Public", "john@example.com"));
        let p1 = doc.page("John resume 1");
        doc.page("John resume 2");
        let p3 = doc.page(details("Jane Doe", "jane@example.com"));
        let p4 = doc.page("Jane resume 1");
        doc.bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(Bookmark::new("john.pdf", p1))
            .bookmark(Bookmark::new("2. Candidate Details", p3))
            .bookmark(Bookmark::new("jane.pdf", p4));

        let (sink, stats) = run_one(&doc);

        assert_eq!(
            sink.candidates,
            vec![
                CandidateRecord {
                    id: 1,
                    title: "Mr".into(),
                    first_name: "John".into(),
                    last_name: "Public".into(),
                    email: "john@example.com".into(),
                },
                CandidateRecord {
                    id: 2,
                    title: "".into(),
                    first_name: "Jane".into(),
                    last_name: "Doe".into(),
                    email: "jane@example.com".into(),
                },
            ]
        );
        assert_eq!(resume_pages(&sink, 1), vec!["John resume 1", "John resume 2"]);
        assert_eq!(resume_pages(&sink, 2), vec!["Jane resume 1"]);
        assert_eq!(stats.candidates, 2);
        assert_eq!(stats.resumes, 2);
        assert_eq!(stats.resume_errors, 0);
        assert!(!stats.has_failures());
    }

    #[test]
    fn test_error_marker_counts_without_output() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page(details("Jane Doe", "jane@example.com"));
        let p1 = doc.page("placeholder");
        doc.bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(Bookmark::new("resume.pdf (Error)", p1));

        let (sink, stats) = run_one(&doc);
        assert_eq!(stats.resume_errors, 1);
        assert_eq!(stats.resumes, 0);
        assert!(sink.resumes.is_empty());
    }

    #[test]
    fn test_resume_binds_to_current_candidate_when_out_of_order() {
        // Resume of candidate 2 exported ahead of its details page
        let mut doc = MemoryDocument::new();
        let p0 = doc.page(details("Ann Lee", "ann@example.com"));
        let p1 = doc.page("Bob resume");
        let p2 = doc.page(details("Bob Lee", "bob@example.com"));
        doc.bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(Bookmark::new("bob.pdf", p1))
            .bookmark(Bookmark::new("2. Candidate Details", p2));

        let (sink, stats) = run_one(&doc);
        assert_eq!(sink.resumes.len(), 1);
        assert_eq!(sink.resumes[0].candidate_id, 1);
        assert_eq!(resume_pages(&sink, 1), vec!["Bob resume"]);
        assert_eq!(stats.candidates, 2);
    }

    #[test]
    fn test_orphan_resume_is_skipped() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page("orphan");
        let p1 = doc.page(details("Ann Lee", "ann@example.com"));
        doc.bookmark(Bookmark::new("stray.pdf", p0))
            .bookmark(Bookmark::new("1. Candidate Details", p1));

        let (sink, stats) = run_one(&doc);
        assert!(sink.resumes.is_empty());
        assert_eq!(stats.orphan_resumes, 1);
        assert_eq!(stats.candidates, 1);
    }

    #[test]
    fn test_parse_failure_keeps_ids_contiguous() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page(details("Ann Lee", "ann@example.com"));
        let p1 = doc.page("Bob Lee\nno label here\n");
        let p2 = doc.page(details("Cat Lee", "cat@example.com"));
        doc.bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(Bookmark::new("2. Candidate Details", p1))
            .bookmark(Bookmark::new("3. Candidate Details", p2));

        let (sink, stats) = run_one(&doc);
        let ids: Vec<u32> = sink.candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(sink.candidates[1], CandidateRecord::flagged(2));
        assert_eq!(stats.candidate_failures, vec![2]);
        assert!(stats.has_failures());
    }

    #[test]
    fn test_unresolved_details_page_is_flagged() {
        let mut doc = MemoryDocument::new();
        doc.page("whatever");
        doc.bookmark(Bookmark::unresolved("1. Candidate Details"));

        let (sink, stats) = run_one(&doc);
        assert_eq!(sink.candidates, vec![CandidateRecord::flagged(1)]);
        assert_eq!(stats.candidate_failures, vec![1]);
    }

    #[test]
    fn test_nested_bookmarks_are_ignored() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page(details("Ann Lee", "ann@example.com"));
        let p1 = doc.page("cv page 1");
        let p2 = doc.page("cv page 2");
        let p3 = doc.page(details("Bob Lee", "bob@example.com"));
        doc.bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(
                Bookmark::new("ann.pdf", p1)
                    .with_child(Bookmark::new("attachment.pdf", p2))
                    .with_child(Bookmark::new("Referee Candidate Details", p2)),
            )
            .bookmark(Bookmark::new("2. Candidate Details", p3));

        let (sink, stats) = run_one(&doc);
        assert_eq!(stats.candidates, 2);
        assert_eq!(stats.resumes, 1);
        assert_eq!(stats.unrecognized, 0);
        assert_eq!(resume_pages(&sink, 1), vec!["cv page 1", "cv page 2"]);
    }

    #[test]
    fn test_last_resume_runs_to_document_end() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page(details("Ann Lee", "ann@example.com"));
        let p1 = doc.page("cv 1");
        doc.page("cv 2");
        doc.page("cv 3");
        doc.bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(Bookmark::new("ann.pdf", p1));

        let (sink, _) = run_one(&doc);
        assert_eq!(resume_pages(&sink, 1), vec!["cv 1", "cv 2", "cv 3"]);
    }

    #[test]
    fn test_malformed_resume_does_not_stop_run() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page(details("Ann Lee", "ann@example.com"));
        let p1 = doc.page(details("Bob Lee", "bob@example.com"));
        let p2 = doc.page("bob cv");
        doc.bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(Bookmark::unresolved("ann.pdf"))
            .bookmark(Bookmark::new("2. Candidate Details", p1))
            .bookmark(Bookmark::new("bob.pdf", p2));

        let (sink, stats) = run_one(&doc);
        assert_eq!(stats.segment_failures, 1);
        assert_eq!(stats.resumes, 1);
        assert_eq!(sink.resumes[0].candidate_id, 2);
    }

    #[test]
    fn test_unrecognized_bookmarks_counted() {
        let mut doc = MemoryDocument::new();
        let p0 = doc.page("cover");
        doc.bookmark(Bookmark::new("Cover Sheet", p0));

        let (sink, stats) = run_one(&doc);
        assert!(sink.candidates.is_empty());
        assert_eq!(stats.unrecognized, 1);
    }

    #[test]
    fn test_counter_continues_across_documents() {
        let mut first = MemoryDocument::new();
        let p = first.page(details("Ann Lee", "ann@example.com"));
        first.bookmark(Bookmark::new("1. Candidate Details", p));

        let mut second = MemoryDocument::new();
        let p0 = second.page(details("Bob Lee", "bob@example.com"));
        let p1 = second.page("bob cv");
        second
            .bookmark(Bookmark::new("1. Candidate Details", p0))
            .bookmark(Bookmark::new("bob.pdf", p1));

        let mut exploder = Exploder::new(MemorySink::new(), TitleSet::default());
        exploder.process_document("first", &first).unwrap();
        assert_eq!(exploder.state().current_candidate(), 1);
        exploder.process_document("second", &second).unwrap();
        let (sink, stats) = exploder.finish().unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.candidates, 2);
        assert_eq!(sink.candidates[1].id, 2);
        assert_eq!(sink.resumes[0].candidate_id, 2);
    }

    #[test]
    fn test_segments_are_disjoint() {
        let mut doc = MemoryDocument::new();
        for n in 1..=4 {
            let details_page = doc.page(details(&format!("Person{n} Lee"), "p@example.com"));
            let resume_page = doc.page(format!("cv {n}a"));
            doc.page(format!("cv {n}b"));
            doc.bookmark(Bookmark::new(format!("{n}. Candidate Details"), details_page))
                .bookmark(Bookmark::new(format!("cv{n}.pdf"), resume_page));
        }

        let (sink, stats) = run_one(&doc);
        assert_eq!(stats.resumes, 4);

        let mut seen = std::collections::HashSet::new();
        for id in 1..=4 {
            for page in resume_pages(&sink, id) {
                assert!(page.starts_with(&format!("cv {id}")));
                assert!(seen.insert(page), "page extracted twice");
            }
        }
    }
}
