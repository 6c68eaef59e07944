use anyhow::{Context, Result};
use regex::Regex;

use super::fold::HeadedLines;

/// Ordinal marker before a header: 一..六, their formal variants, or an
/// Arabic number, followed by `、` or `.`.
const ORDINAL_MARKER: &str = r"(?:[一二三四五六壹貳參肆伍陸]|[0-9]{1,2})\s*[、.]";

/// Short non-header token that sometimes sits between the ordinal and the
/// header text, e.g. `五、SARS 疾病分類`.
const HEADER_PREFIX_TOKEN: &str = r"[A-Za-z0-9]{1,12}\s+";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKey {
    ClinicalCondition,
    LabCriteria,
    EpidemiologyCondition,
    ReportingDefinition,
    Classification,
    SpecimenCollection,
}

impl SectionKey {
    pub const ALL: [SectionKey; 6] = [
        SectionKey::ClinicalCondition,
        SectionKey::LabCriteria,
        SectionKey::EpidemiologyCondition,
        SectionKey::ReportingDefinition,
        SectionKey::Classification,
        SectionKey::SpecimenCollection,
    ];

    /// Canonical header text, also used as the record's output key.
    pub fn label(self) -> &'static str {
        match self {
            SectionKey::ClinicalCondition => "臨床條件",
            SectionKey::LabCriteria => "檢驗條件",
            SectionKey::EpidemiologyCondition => "流行病學條件",
            SectionKey::ReportingDefinition => "通報定義",
            SectionKey::Classification => "疾病分類",
            SectionKey::SpecimenCollection => "檢體採檢送驗事項",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Header texts in match priority order. Longer labels come first so that a
/// label which extends another is never claimed by the shorter one.
const HEADER_VOCABULARY: [(SectionKey, &str); 7] = [
    (SectionKey::SpecimenCollection, "檢體採檢送驗事項"),
    (SectionKey::EpidemiologyCondition, "流行病學條件"),
    (SectionKey::ClinicalCondition, "臨床條件"),
    (SectionKey::LabCriteria, "檢驗條件"),
    (SectionKey::ReportingDefinition, "通報定義"),
    (SectionKey::Classification, "疾病分類"),
    (SectionKey::Classification, "病例分類"),
];

/// All six section bodies of one document. Every key is always present;
/// a missing header leaves its value empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    values: [String; 6],
}

impl Sections {
    pub fn get(&self, key: SectionKey) -> &str {
        &self.values[key.index()]
    }

    pub fn into_values(self) -> [String; 6] {
        self.values
    }

    fn set(&mut self, key: SectionKey, value: String) {
        self.values[key.index()] = value;
    }
}

#[derive(Debug)]
struct HeaderMatcher {
    key: SectionKey,
    pattern: Regex,
}

/// Splits normalized text into the fixed sections by full-line header
/// detection.
#[derive(Debug)]
pub struct SectionSegmenter {
    matchers: Vec<HeaderMatcher>,
}

impl SectionSegmenter {
    pub fn new() -> Result<Self> {
        let matchers = HEADER_VOCABULARY
            .iter()
            .map(|(key, label)| {
                let pattern = Regex::new(&format!(
                    r"^(?:{ORDINAL_MARKER}\s*)?(?:{HEADER_PREFIX_TOKEN})?{}\s*[：:]?$",
                    regex::escape(label)
                ))
                .with_context(|| format!("failed to compile section header regex for {label}"))?;

                Ok(HeaderMatcher { key: *key, pattern })
            })
            .collect::<Result<Vec<HeaderMatcher>>>()?;

        Ok(Self { matchers })
    }

    pub fn segment(&self, text: &str) -> Sections {
        let blocks = text
            .lines()
            .fold(HeadedLines::new(), |lines, raw_line| {
                let line = raw_line.trim();
                match self.detect_header(line) {
                    Some(key) => lines.open(key, None),
                    None => lines.push(line),
                }
            })
            .finish();

        let mut sections = Sections::default();
        for (key, body) in blocks {
            sections.set(key, body);
        }
        sections
    }

    /// Resolves a trimmed line to its section, aliases included.
    pub fn detect_header(&self, line: &str) -> Option<SectionKey> {
        self.matchers
            .iter()
            .find(|matcher| matcher.pattern.is_match(line))
            .map(|matcher| matcher.key)
    }
}
