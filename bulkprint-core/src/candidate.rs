//! Candidate details page parsing
//!
//! A details page starts with the candidate's full name, optionally prefixed
//! by a salutation, and somewhere below carries an `Email Address:` label
//! whose value sits on the next line.

use crate::error::{BulkPrintError, Result};
use serde::{Deserialize, Serialize};

/// Label preceding the candidate's email address
pub const EMAIL_LABEL: &str = "Email Address:";

/// Salutations recognized when no title list is configured
pub const DEFAULT_TITLES: &[&str] = &["Mr", "Mrs", "Ms", "Miss", "Dr", "Professor"];

/// Set of salutations that may prefix a name line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleSet(Vec<String>);

impl TitleSet {
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(titles.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|title| title == token)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for TitleSet {
    fn default() -> Self {
        Self::new(DEFAULT_TITLES.iter().copied())
    }
}

/// One row of the candidates table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: u32,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl CandidateRecord {
    /// Row kept for a candidate whose page could not be parsed, so ids stay contiguous
    pub fn flagged(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn full_name(&self) -> String {
        [&self.title, &self.first_name, &self.last_name]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parse the rendered text of a candidate details page
pub fn parse_candidate(id: u32, text: &str, titles: &TitleSet) -> Result<CandidateRecord> {
    let fail = |reason: &str| BulkPrintError::CandidateParse {
        candidate_id: id,
        reason: reason.to_string(),
        raw: text.to_string(),
    };

    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let name_line = lines
        .iter()
        .find(|line| !line.is_empty())
        .ok_or_else(|| fail("page has no text"))?;
    let tokens: Vec<&str> = name_line.split_whitespace().collect();

    let (title, first_name) = match tokens.as_slice() {
        [first, second, ..] if titles.contains(first) => (*first, *second),
        [only] if titles.contains(only) => return Err(fail("name line holds only a title")),
        [first, ..] => ("", *first),
        [] => return Err(fail("empty name line")),
    };
    let last_name = tokens.last().copied().unwrap_or(first_name);

    let email = find_email(&lines).ok_or_else(|| fail("missing email address"))?;

    Ok(CandidateRecord {
        id,
        title: title.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
    })
}

fn find_email<'a>(lines: &[&'a str]) -> Option<&'a str> {
    let label_at = lines.iter().position(|line| line.contains(EMAIL_LABEL))?;

    let label_line = lines[label_at];
    let inline = label_line
        .split_once(EMAIL_LABEL)
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty());
    if inline.is_some() {
        return inline;
    }

    lines[label_at + 1..]
        .iter()
        .copied()
        .find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(name: &str, email: &str) -> String {
        format!("{name}\nPhone Number:\n0400 000 000\n{EMAIL_LABEL}\n{email}\nAddress:\n1 Main St\n")
    }

    #[test]
    fn test_title_and_middle_name() {
        let record = parse_candidate(1, &page("Mr John Q Public", "john@example.com"), &TitleSet::default())
            .unwrap();
        assert_eq!(
            record,
            CandidateRecord {
                id: 1,
                title: "Mr".to_string(),
                first_name: "John".to_string(),
                last_name: "Public".to_string(),
                email: "john@example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_no_title() {
        let record =
            parse_candidate(2, &page("Jane Doe", "jane@example.com"), &TitleSet::default()).unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.first_name, "Jane");
        assert_eq!(record.last_name, "Doe");
        assert_eq!(record.email, "jane@example.com");
    }

    #[test]
    fn test_leading_blank_lines_and_padding() {
        let text = "\n   \n  Dr   Alice   Smith  \nEmail Address:\n   alice@uni.edu   \n";
        let record = parse_candidate(3, text, &TitleSet::default()).unwrap();
        assert_eq!(record.title, "Dr");
        assert_eq!(record.first_name, "Alice");
        assert_eq!(record.last_name, "Smith");
        assert_eq!(record.email, "alice@uni.edu");
    }

    #[test]
    fn test_single_name_is_first_and_last() {
        let record = parse_candidate(4, &page("Cher", "cher@example.com"), &TitleSet::default()).unwrap();
        assert_eq!(record.first_name, "Cher");
        assert_eq!(record.last_name, "Cher");
    }

    #[test]
    fn test_inline_email_value() {
        let text = "Ms Kim Lee\nEmail Address: kim@example.com\n";
        let record = parse_candidate(5, text, &TitleSet::default()).unwrap();
        assert_eq!(record.email, "kim@example.com");
    }

    #[test]
    fn test_blank_line_between_label_and_value() {
        let text = "Kim Lee\nEmail Address:\n\nkim@example.com\n";
        let record = parse_candidate(5, text, &TitleSet::default()).unwrap();
        assert_eq!(record.email, "kim@example.com");
    }

    #[test]
    fn test_unknown_title_becomes_first_name() {
        let record = parse_candidate(6, &page("Sir Ian Holm", "ian@example.com"), &TitleSet::default())
            .unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.first_name, "Sir");
        assert_eq!(record.last_name, "Holm");
    }

    #[test]
    fn test_custom_title_set() {
        let titles = TitleSet::new(["Sir"]);
        let record = parse_candidate(6, &page("Sir Ian Holm", "ian@example.com"), &titles).unwrap();
        assert_eq!(record.title, "Sir");
        assert_eq!(record.first_name, "Ian");
    }

    #[test]
    fn test_missing_email_label() {
        let err = parse_candidate(7, "Jane Doe\nPhone:\n123\n", &TitleSet::default()).unwrap_err();
        match err {
            BulkPrintError::CandidateParse {
                candidate_id, raw, ..
            } => {
                assert_eq!(candidate_id, 7);
                assert!(raw.contains("Jane Doe"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_email_label_without_value() {
        let err = parse_candidate(8, "Jane Doe\nEmail Address:\n", &TitleSet::default()).unwrap_err();
        assert!(matches!(err, BulkPrintError::CandidateParse { candidate_id: 8, .. }));
    }

    #[test]
    fn test_empty_page() {
        let err = parse_candidate(9, "  \n\n", &TitleSet::default()).unwrap_err();
        assert!(err.to_string().contains("page has no text"));
    }

    #[test]
    fn test_title_only() {
        let err = parse_candidate(10, &page("Mr", "x@example.com"), &TitleSet::default()).unwrap_err();
        assert!(err.to_string().contains("only a title"));
    }

    #[test]
    fn test_flagged_and_full_name() {
        let flagged = CandidateRecord::flagged(11);
        assert_eq!(flagged.id, 11);
        assert_eq!(flagged.full_name(), "");

        let record = parse_candidate(1, &page("Mr John Q Public", "j@x.com"), &TitleSet::default())
            .unwrap();
        assert_eq!(record.full_name(), "Mr John Public");
    }
}
