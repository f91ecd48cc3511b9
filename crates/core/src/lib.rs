//! Core library for sectionrank
//!
//! This crate implements the **Functional Core** of the sectionrank application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! sectionrank is split in three crates:
//!
//! - **`sectionrank_core`** (this crate): every decision about headings, sections and relevance
//! - **`pdf`**: the concrete character stream, decoding PDF content into positioned glyphs
//! - **`sectionrank`**: file-system walking, parallelism, JSON output (the Imperative Shell)
//!
//! Documents reach this crate only through the [`stream::CharacterStream`] trait, and
//! natural-language processing only through [`text::TextAnalyzer`]. Both are passed in
//! explicitly, so every stage can be tested with hand-built fixture data.
//!
//! # Pipeline
//!
//! 1. [`fonts`]: font-size histogram and the four heading cutoffs of a document
//! 2. [`heading`]: rule tables deciding whether a line is a heading, and its level
//! 3. [`outline`]: per-document outline with title and de-duplicated entries
//! 4. [`segment`]: the text span of every outline entry
//! 5. [`rank`]: TF-IDF relevance of every section against the persona/job query
//! 6. [`extract`]: query-focused sentences of the best sections
//! 7. [`report`]: the persona report tying the stages together
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use sectionrank_core::config::AnalysisConfig;
//! use sectionrank_core::report::{analyze_collection, analyze_document, RunOutcome};
//! use sectionrank_core::text::EnglishAnalyzer;
//! use sectionrank_core::types::QueryContext;
//!
//! let analyzer = EnglishAnalyzer::new()?;
//! let docs = vec![analyze_document(&stream, Path::new("guide.pdf"))];
//! let query = QueryContext::new("Travel planner", "Plan a four-day trip");
//!
//! match analyze_collection(docs, &query, &AnalysisConfig::default(), &analyzer, now) {
//!     RunOutcome::Completed(report) => println!("{}", report.extracted_sections.len()),
//!     RunOutcome::Skipped(reason) => eprintln!("skipped: {reason}"),
//! }
//! ```

pub mod config;
pub mod extract;
pub mod fonts;
pub mod heading;
pub mod outline;
pub mod rank;
pub mod report;
pub mod segment;
pub mod stopwords;
pub mod stream;
pub mod text;
pub mod types;
pub mod vector;
