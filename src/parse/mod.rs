//! Text-normalization and section-segmentation engine for extracted
//! case-definition documents and disease manuals.
//!
//! Everything here is a pure function over strings. [`DocumentParser`] only
//! holds compiled patterns, so one instance can be shared across threads and
//! reused for any number of documents.

use anyhow::Result;

mod cases;
mod english_name;
mod fold;
mod manual;
mod normalize;
mod record;
mod sections;
#[cfg(test)]
mod tests;

pub use cases::{CaseCategory, CaseClassifier, CaseDefinitions};
pub use english_name::EnglishNameExtractor;
pub use manual::{ManualRecord, ManualSectionKey, ManualSegmenter, is_page_footer};
pub use normalize::normalize;
pub use record::{RawDocument, RecordFields, StructuredRecord};
pub use sections::{SectionKey, SectionSegmenter, Sections};

#[derive(Debug)]
pub struct DocumentParser {
    segmenter: SectionSegmenter,
    classifier: CaseClassifier,
    english_names: EnglishNameExtractor,
    manual: ManualSegmenter,
}

impl DocumentParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            segmenter: SectionSegmenter::new()?,
            classifier: CaseClassifier::new()?,
            english_names: EnglishNameExtractor::new()?,
            manual: ManualSegmenter::new()?,
        })
    }

    /// raw text -> normalize -> segment -> classify the classification
    /// section; the English name is read from the normalized text.
    pub fn parse(&self, document: &RawDocument) -> StructuredRecord {
        let normalized = normalize(&document.raw_text);
        let sections = self.segment(&normalized);
        let cases = self.classify_cases(sections.get(SectionKey::Classification));
        let english_name = self.extract_english_name(&normalized);

        StructuredRecord::from_parts(sections, cases, english_name)
    }

    /// Disease manuals share normalization but have their own chapter
    /// vocabulary and running page footers.
    pub fn parse_manual(&self, document: &RawDocument) -> ManualRecord {
        self.manual.segment(&normalize(&document.raw_text))
    }

    pub fn segment(&self, normalized_text: &str) -> Sections {
        self.segmenter.segment(normalized_text)
    }

    pub fn classify_cases(&self, classification_text: &str) -> CaseDefinitions {
        self.classifier.classify(classification_text)
    }

    pub fn extract_english_name(&self, normalized_text: &str) -> String {
        self.english_names.extract(normalized_text)
    }
}
