use serde::{Deserialize, Serialize};

use super::cases::{CaseCategory, CaseDefinitions};
use super::sections::{SectionKey, Sections};

/// Extracted text of one source document, as handed over by the PDF
/// extraction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub identifier: String,
    pub raw_text: String,
}

impl RawDocument {
    pub fn new(identifier: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Fixed ten-key record produced for every document. Empty values are kept
/// as empty strings, never dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    #[serde(rename = "臨床條件", default)]
    pub clinical_condition: String,
    #[serde(rename = "檢驗條件", default)]
    pub lab_criteria: String,
    #[serde(rename = "流行病學條件", default)]
    pub epidemiology_condition: String,
    #[serde(rename = "通報定義", default)]
    pub reporting_definition: String,
    #[serde(rename = "疾病分類", default)]
    pub classification: String,
    #[serde(rename = "檢體採檢送驗事項", default)]
    pub specimen_collection: String,
    #[serde(default)]
    pub suspected_case: String,
    #[serde(default)]
    pub probable_case: String,
    #[serde(default)]
    pub confirmed_case: String,
    #[serde(default)]
    pub english_name: String,
}

impl StructuredRecord {
    pub const KEY_COUNT: usize = 10;

    pub fn from_parts(sections: Sections, cases: CaseDefinitions, english_name: String) -> Self {
        let [
            clinical_condition,
            lab_criteria,
            epidemiology_condition,
            reporting_definition,
            classification,
            specimen_collection,
        ] = sections.into_values();

        Self {
            clinical_condition,
            lab_criteria,
            epidemiology_condition,
            reporting_definition,
            classification,
            specimen_collection,
            suspected_case: cases.suspected_case,
            probable_case: cases.probable_case,
            confirmed_case: cases.confirmed_case,
            english_name,
        }
    }

    /// Output keys paired with their values, in column order.
    pub fn fields(&self) -> [(&'static str, &str); Self::KEY_COUNT] {
        [
            (SectionKey::ClinicalCondition.label(), self.clinical_condition.as_str()),
            (SectionKey::LabCriteria.label(), self.lab_criteria.as_str()),
            (SectionKey::EpidemiologyCondition.label(), self.epidemiology_condition.as_str()),
            (SectionKey::ReportingDefinition.label(), self.reporting_definition.as_str()),
            (SectionKey::Classification.label(), self.classification.as_str()),
            (SectionKey::SpecimenCollection.label(), self.specimen_collection.as_str()),
            (CaseCategory::Suspected.as_str(), self.suspected_case.as_str()),
            (CaseCategory::Probable.as_str(), self.probable_case.as_str()),
            (CaseCategory::Confirmed.as_str(), self.confirmed_case.as_str()),
            ("english_name", self.english_name.as_str()),
        ]
    }
}

/// Key/value view over a parsed record, shared by every record shape the
/// parser produces.
pub trait RecordFields {
    /// Output keys paired with their values, in column order.
    fn keyed_values(&self) -> Vec<(&'static str, &str)>;

    /// True when at least one section header was found with a body. Callers
    /// fall back to the raw text for display otherwise.
    fn has_structured_sections(&self) -> bool;

    fn populated_count(&self) -> usize {
        self.keyed_values()
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .count()
    }
}

impl RecordFields for StructuredRecord {
    fn keyed_values(&self) -> Vec<(&'static str, &str)> {
        self.fields().to_vec()
    }

    fn has_structured_sections(&self) -> bool {
        self.fields()[..SectionKey::ALL.len()]
            .iter()
            .any(|(_, value)| !value.is_empty())
    }
}
