use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::fold::HeadedLines;
use super::record::RecordFields;

/// Manual chapters run past six, so the ordinal set goes up to 十 / 拾 and
/// may be compounded (`十一、`). Unlike case definitions the ordinal is
/// required.
const MANUAL_ORDINAL: &str = r"[一二三四五六七八九十壹貳參肆伍陸柒捌玖拾]+\s*[、.]";

/// English gloss printed after a chapter title, e.g. `（Disease description）`.
const ENGLISH_GLOSS: &str = r"(?:\s*[（(][A-Za-z\s\-]+[）)])?";

const FOOTER_REVISION_SUFFIX: &str = "年修訂";
const FOOTER_HANDBOOK_MARKER: &str = "工作手冊";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManualSectionKey {
    Overview,
    Pathogen,
    Epidemiology,
    Reservoir,
    Transmission,
    IncubationPeriod,
    CommunicablePeriod,
    Susceptibility,
    CaseDefinition,
    SpecimenCollection,
    ControlMeasures,
}

impl ManualSectionKey {
    pub const ALL: [ManualSectionKey; 11] = [
        ManualSectionKey::Overview,
        ManualSectionKey::Pathogen,
        ManualSectionKey::Epidemiology,
        ManualSectionKey::Reservoir,
        ManualSectionKey::Transmission,
        ManualSectionKey::IncubationPeriod,
        ManualSectionKey::CommunicablePeriod,
        ManualSectionKey::Susceptibility,
        ManualSectionKey::CaseDefinition,
        ManualSectionKey::SpecimenCollection,
        ManualSectionKey::ControlMeasures,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ManualSectionKey::Overview => "疾病概述",
            ManualSectionKey::Pathogen => "致病原",
            ManualSectionKey::Epidemiology => "流行病學",
            ManualSectionKey::Reservoir => "傳染窩",
            ManualSectionKey::Transmission => "傳染方式",
            ManualSectionKey::IncubationPeriod => "潛伏期",
            ManualSectionKey::CommunicablePeriod => "可傳染期",
            ManualSectionKey::Susceptibility => "感受性及抵抗力",
            ManualSectionKey::CaseDefinition => "病例定義",
            ManualSectionKey::SpecimenCollection => "檢體採檢送驗事項",
            ManualSectionKey::ControlMeasures => "防疫措施",
        }
    }
}

/// The eleven chapters of a disease manual. Missing chapters stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualRecord {
    #[serde(rename = "疾病概述", default)]
    pub overview: String,
    #[serde(rename = "致病原", default)]
    pub pathogen: String,
    #[serde(rename = "流行病學", default)]
    pub epidemiology: String,
    #[serde(rename = "傳染窩", default)]
    pub reservoir: String,
    #[serde(rename = "傳染方式", default)]
    pub transmission: String,
    #[serde(rename = "潛伏期", default)]
    pub incubation_period: String,
    #[serde(rename = "可傳染期", default)]
    pub communicable_period: String,
    #[serde(rename = "感受性及抵抗力", default)]
    pub susceptibility: String,
    #[serde(rename = "病例定義", default)]
    pub case_definition: String,
    #[serde(rename = "檢體採檢送驗事項", default)]
    pub specimen_collection: String,
    #[serde(rename = "防疫措施", default)]
    pub control_measures: String,
}

impl ManualRecord {
    pub const KEY_COUNT: usize = 11;

    pub fn get(&self, key: ManualSectionKey) -> &str {
        match key {
            ManualSectionKey::Overview => &self.overview,
            ManualSectionKey::Pathogen => &self.pathogen,
            ManualSectionKey::Epidemiology => &self.epidemiology,
            ManualSectionKey::Reservoir => &self.reservoir,
            ManualSectionKey::Transmission => &self.transmission,
            ManualSectionKey::IncubationPeriod => &self.incubation_period,
            ManualSectionKey::CommunicablePeriod => &self.communicable_period,
            ManualSectionKey::Susceptibility => &self.susceptibility,
            ManualSectionKey::CaseDefinition => &self.case_definition,
            ManualSectionKey::SpecimenCollection => &self.specimen_collection,
            ManualSectionKey::ControlMeasures => &self.control_measures,
        }
    }

    fn set(&mut self, key: ManualSectionKey, value: String) {
        let slot = match key {
            ManualSectionKey::Overview => &mut self.overview,
            ManualSectionKey::Pathogen => &mut self.pathogen,
            ManualSectionKey::Epidemiology => &mut self.epidemiology,
            ManualSectionKey::Reservoir => &mut self.reservoir,
            ManualSectionKey::Transmission => &mut self.transmission,
            ManualSectionKey::IncubationPeriod => &mut self.incubation_period,
            ManualSectionKey::CommunicablePeriod => &mut self.communicable_period,
            ManualSectionKey::Susceptibility => &mut self.susceptibility,
            ManualSectionKey::CaseDefinition => &mut self.case_definition,
            ManualSectionKey::SpecimenCollection => &mut self.specimen_collection,
            ManualSectionKey::ControlMeasures => &mut self.control_measures,
        };
        *slot = value;
    }
}

impl RecordFields for ManualRecord {
    fn keyed_values(&self) -> Vec<(&'static str, &str)> {
        ManualSectionKey::ALL
            .into_iter()
            .map(|key| (key.label(), self.get(key)))
            .collect()
    }

    fn has_structured_sections(&self) -> bool {
        ManualSectionKey::ALL
            .into_iter()
            .any(|key| !self.get(key).is_empty())
    }
}

#[derive(Debug)]
struct ManualHeaderMatcher {
    key: ManualSectionKey,
    pattern: Regex,
}

/// Splits normalized disease-manual text into its chapters.
#[derive(Debug)]
pub struct ManualSegmenter {
    matchers: Vec<ManualHeaderMatcher>,
}

impl ManualSegmenter {
    pub fn new() -> Result<Self> {
        let matchers = ManualSectionKey::ALL
            .into_iter()
            .map(|key| {
                let label = key.label();
                let pattern = Regex::new(&format!(
                    r"^{MANUAL_ORDINAL}\s*{}{ENGLISH_GLOSS}\s*$",
                    regex::escape(label)
                ))
                .with_context(|| format!("failed to compile manual header regex for {label}"))?;

                Ok(ManualHeaderMatcher { key, pattern })
            })
            .collect::<Result<Vec<ManualHeaderMatcher>>>()?;

        Ok(Self { matchers })
    }

    pub fn segment(&self, text: &str) -> ManualRecord {
        let blocks = text
            .lines()
            .map(str::trim)
            .filter(|line| !is_page_footer(line))
            .fold(HeadedLines::new(), |lines, line| match self.detect_header(line) {
                Some(key) => lines.open(key, None),
                None => lines.push(line),
            })
            .finish();

        let mut record = ManualRecord::default();
        for (key, body) in blocks {
            record.set(key, body);
        }
        record
    }

    pub fn detect_header(&self, line: &str) -> Option<ManualSectionKey> {
        self.matchers
            .iter()
            .find(|matcher| matcher.pattern.is_match(line))
            .map(|matcher| matcher.key)
    }
}

/// Running page header/footer of the manual PDFs: a revision stamp, or the
/// handbook title with its dash-separated page number. NFKC turns the
/// full-width dash into `-`, so both forms are accepted.
pub fn is_page_footer(line: &str) -> bool {
    line.ends_with(FOOTER_REVISION_SUFFIX)
        || (line.contains(FOOTER_HANDBOOK_MARKER) && (line.contains('－') || line.contains('-')))
}
