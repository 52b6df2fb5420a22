//! Test Suite for bulkprint
//!
//! Fixture generation shared by the library and CLI integration tests.

pub mod generators;

pub use generators::{sample_export, BulkPrintBuilder, FixtureBookmark, TextLayout};

/// Common test utilities
pub mod utils {
    use std::path::PathBuf;

    /// Create a temporary directory for test outputs
    pub fn create_test_output_dir() -> anyhow::Result<tempfile::TempDir> {
        Ok(tempfile::tempdir()?)
    }

    /// Write the standard sample export into `dir` and return its path
    pub fn write_sample_export(dir: &std::path::Path) -> anyhow::Result<PathBuf> {
        let path = dir.join("BulkPrint.pdf");
        super::sample_export().write_to(&path)?;
        Ok(path)
    }
}
