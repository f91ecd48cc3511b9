//! Persona analysis of a document collection.
//!
//! Documents are analyzed independently ([`analyze_document`]) and then
//! combined by [`analyze_collection`], which is the barrier where every
//! section of every document is known and the shared vector space is built.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::extract::SentenceExtractor;
use crate::outline::extract_outline;
use crate::rank::RelevanceRanker;
use crate::segment::segment_document;
use crate::stream::CharacterStream;
use crate::text::TextAnalyzer;
use crate::types::{Outline, QueryContext, RefinedSegment, Section};
use crate::vector::TfidfModel;

/// Outline and sections of one input document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAnalysis {
    /// File name without directories.
    pub name: String,
    pub outline: Outline,
    pub sections: Vec<Section>,
}

impl DocumentAnalysis {
    /// Placeholder for a document whose processing did not finish: the
    /// error outline and no sections.
    pub fn unreadable(path: &Path) -> Self {
        DocumentAnalysis {
            name: document_name(path),
            outline: Outline::error(),
            sections: Vec::new(),
        }
    }
}

/// File name of `path`, or the whole path when it has none.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read, outline and segment a single document.
///
/// Never fails: an unreadable document comes back with the error sentinel
/// outline and no sections.
pub fn analyze_document(stream: &dyn CharacterStream, path: &Path) -> DocumentAnalysis {
    let name = document_name(path);
    let (outline, pages) = extract_outline(stream, path);
    let sections = segment_document(&name, &outline, &pages);
    DocumentAnalysis {
        name,
        outline,
        sections,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub page_number: usize,
    pub section_title: String,
    pub importance_rank: f64,
}

impl From<&Section> for ExtractedSection {
    fn from(section: &Section) -> Self {
        ExtractedSection {
            document: section.document.clone(),
            page_number: section.page,
            section_title: section.title.clone(),
            importance_rank: section.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaReport {
    pub metadata: ReportMetadata,
    /// Every section, best first.
    pub extracted_sections: Vec<ExtractedSection>,
    pub sub_section_analysis: Vec<RefinedSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Persona and job are both blank.
    MissingQueryInput,
    /// The collection holds no documents.
    NoDocumentsFound,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingQueryInput => write!(f, "persona and job are both empty"),
            SkipReason::NoDocumentsFound => write!(f, "no documents found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(PersonaReport),
    Skipped(SkipReason),
}

/// Why a run over `document_count` documents with `query` would be skipped.
///
/// Callers can check this before reading any document.
pub fn skip_reason(document_count: usize, query: &QueryContext) -> Option<SkipReason> {
    if document_count == 0 {
        Some(SkipReason::NoDocumentsFound)
    } else if query.is_empty() {
        Some(SkipReason::MissingQueryInput)
    } else {
        None
    }
}

/// Rank every section of `documents` against `query` and refine the best.
///
/// `timestamp` is recorded verbatim in the report metadata.
pub fn analyze_collection(
    documents: Vec<DocumentAnalysis>,
    query: &QueryContext,
    config: &AnalysisConfig,
    analyzer: &dyn TextAnalyzer,
    timestamp: impl Into<String>,
) -> RunOutcome {
    if let Some(reason) = skip_reason(documents.len(), query) {
        log::warn!("skipping analysis: {}", reason);
        return RunOutcome::Skipped(reason);
    }

    let metadata = ReportMetadata {
        input_documents: documents.iter().map(|d| d.name.clone()).collect(),
        persona: query.persona.clone(),
        job_to_be_done: query.job.clone(),
        processing_timestamp: timestamp.into(),
    };

    let sections: Vec<Section> = documents.into_iter().flat_map(|d| d.sections).collect();
    if sections.is_empty() {
        log::info!("no sections found in {} document(s)", metadata.input_documents.len());
        return RunOutcome::Completed(PersonaReport {
            metadata,
            extracted_sections: Vec::new(),
            sub_section_analysis: Vec::new(),
        });
    }

    let model = TfidfModel::new(analyzer, config.max_features);
    let ranked = RelevanceRanker::new(&model).rank(sections, query);
    let refined = SentenceExtractor::new(analyzer, config).refine(&ranked, query);

    log::info!(
        "ranked {} section(s), refined {} of them",
        ranked.len(),
        refined.len()
    );

    RunOutcome::Completed(PersonaReport {
        metadata,
        extracted_sections: ranked.iter().map(ExtractedSection::from).collect(),
        sub_section_analysis: refined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{PageText, StreamError, TextLine};
    use crate::text::EnglishAnalyzer;
    use crate::types::{HeadingEntry, HeadingLevel};

    const TIMESTAMP: &str = "2025-07-28T10:15:30.123456";

    fn document(name: &str, sections: Vec<Section>) -> DocumentAnalysis {
        DocumentAnalysis {
            name: name.to_string(),
            outline: Outline {
                title: name.to_string(),
                entries: sections
                    .iter()
                    .map(|s| HeadingEntry::new(HeadingLevel::H1, s.title.clone(), s.page))
                    .collect(),
            },
            sections,
        }
    }

    fn collection() -> Vec<DocumentAnalysis> {
        vec![
            document(
                "lease.pdf",
                vec![Section::new(
                    "lease.pdf",
                    2,
                    "Termination",
                    "Either party may terminate the lease with ninety days written notice.",
                )],
            ),
            document(
                "cookbook.pdf",
                vec![
                    Section::new(
                        "cookbook.pdf",
                        5,
                        "Curries",
                        "This vegan chickpea curry is a weeknight staple. Serve with rice.",
                    ),
                    Section::new("cookbook.pdf", 9, "Index", ""),
                ],
            ),
        ]
    }

    #[test]
    fn test_full_report() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let query = QueryContext::new("Nutritionist", "Find vegan recipes");
        let outcome = analyze_collection(
            collection(),
            &query,
            &AnalysisConfig::default(),
            &analyzer,
            TIMESTAMP,
        );

        let RunOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(
            report.metadata.input_documents,
            vec!["lease.pdf", "cookbook.pdf"]
        );
        assert_eq!(report.metadata.job_to_be_done, "Find vegan recipes");
        assert_eq!(report.metadata.processing_timestamp, TIMESTAMP);

        let titles: Vec<&str> = report
            .extracted_sections
            .iter()
            .map(|s| s.section_title.as_str())
            .collect();
        assert_eq!(titles, vec!["Curries", "Termination", "Index"]);
        assert!(report.extracted_sections[0].importance_rank > 0.0);

        assert_eq!(
            report.sub_section_analysis,
            vec![RefinedSegment {
                document: "cookbook.pdf".to_string(),
                page_number: 5,
                refined_text: "This vegan chickpea curry is a weeknight staple.".to_string(),
            }]
        );
    }

    #[test]
    fn test_report_json_shape() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let query = QueryContext::new("Nutritionist", "Find vegan recipes");
        let RunOutcome::Completed(report) = analyze_collection(
            collection(),
            &query,
            &AnalysisConfig::default(),
            &analyzer,
            TIMESTAMP,
        ) else {
            panic!("expected a completed run");
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metadata"]["persona"], "Nutritionist");
        assert_eq!(json["extracted_sections"][0]["page_number"], 5);
        assert!(json["extracted_sections"][0]["importance_rank"].is_f64());
        assert_eq!(json["sub_section_analysis"][0]["document"], "cookbook.pdf");
    }

    #[test]
    fn test_empty_query_is_skipped() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let outcome = analyze_collection(
            collection(),
            &QueryContext::new("", " "),
            &AnalysisConfig::default(),
            &analyzer,
            TIMESTAMP,
        );
        assert_eq!(outcome, RunOutcome::Skipped(SkipReason::MissingQueryInput));
    }

    #[test]
    fn test_no_documents_is_skipped() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let outcome = analyze_collection(
            Vec::new(),
            &QueryContext::new("Chef", "Plan a menu"),
            &AnalysisConfig::default(),
            &analyzer,
            TIMESTAMP,
        );
        assert_eq!(outcome, RunOutcome::Skipped(SkipReason::NoDocumentsFound));
    }

    #[test]
    fn test_documents_without_sections_give_empty_lists() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let docs = vec![document("blank.pdf", Vec::new())];
        let RunOutcome::Completed(report) = analyze_collection(
            docs,
            &QueryContext::new("Chef", "Plan a menu"),
            &AnalysisConfig::default(),
            &analyzer,
            TIMESTAMP,
        ) else {
            panic!("expected a completed run");
        };
        assert_eq!(report.metadata.input_documents, vec!["blank.pdf"]);
        assert!(report.extracted_sections.is_empty());
        assert!(report.sub_section_analysis.is_empty());
    }

    struct FixtureStream(Vec<PageText>);

    impl CharacterStream for FixtureStream {
        fn read_pages(&self, path: &Path) -> Result<Vec<PageText>, StreamError> {
            if path.extension().is_some_and(|e| e == "pdf") {
                Ok(self.0.clone())
            } else {
                Err(StreamError::new(path.display().to_string(), "not a pdf"))
            }
        }
    }

    #[test]
    fn test_analyze_document_segments_outline() {
        let body = "plain body text that is long enough to be ordinary prose here";
        let stream = FixtureStream(vec![PageText::new(
            1,
            vec![
                TextLine::uniform("1. Overview", 18.0, "Helvetica-Bold"),
                TextLine::uniform(body, 10.0, "Helvetica"),
                TextLine::uniform(body, 10.0, "Helvetica"),
            ],
        )]);

        let analysis = analyze_document(&stream, Path::new("/data/guide.pdf"));
        assert_eq!(analysis.name, "guide.pdf");
        assert_eq!(analysis.sections.len(), 1);
        assert_eq!(analysis.sections[0].document, "guide.pdf");
        assert!(analysis.sections[0].text.starts_with("1. Overview plain body"));

        let broken = analyze_document(&stream, Path::new("/data/notes.txt"));
        assert!(broken.outline.is_error());
        assert!(broken.sections.is_empty());
    }

    #[test]
    fn test_unreadable_document_placeholder() {
        let analysis = DocumentAnalysis::unreadable(Path::new("/data/broken.pdf"));
        assert_eq!(analysis.name, "broken.pdf");
        assert!(analysis.outline.is_error());
        assert!(analysis.sections.is_empty());
    }
}
