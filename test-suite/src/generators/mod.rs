//! PDF Test Generators
//!
//! This module provides utilities for generating test PDFs programmatically.

pub mod bulkprint_builder;

pub use bulkprint_builder::{sample_export, BulkPrintBuilder, FixtureBookmark, TextLayout};
