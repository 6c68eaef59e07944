use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::fold::HeadedLines;

/// `（一）`, `(1)`, `一、`, `1.` style markers in front of a case label.
const CASE_MARKER: &str =
    r"(?:[（(][一二三四五六七八九十0-9]{1,2}[）)]|[一二三四五六七八九十0-9]{1,2}\s*[、.])";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseCategory {
    Suspected,
    Probable,
    Confirmed,
}

impl CaseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseCategory::Suspected => "suspected_case",
            CaseCategory::Probable => "probable_case",
            CaseCategory::Confirmed => "confirmed_case",
        }
    }
}

/// Tried in order. 極可能病例 contains 可能病例, so probable must precede
/// suspected.
const CASE_VOCABULARY: [(CaseCategory, &str); 3] = [
    (CaseCategory::Probable, "極可能病例"),
    (CaseCategory::Suspected, "可能病例"),
    (CaseCategory::Confirmed, "確定病例"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDefinitions {
    pub suspected_case: String,
    pub probable_case: String,
    pub confirmed_case: String,
}

impl CaseDefinitions {
    fn set(&mut self, category: CaseCategory, value: String) {
        match category {
            CaseCategory::Suspected => self.suspected_case = value,
            CaseCategory::Probable => self.probable_case = value,
            CaseCategory::Confirmed => self.confirmed_case = value,
        }
    }
}

/// A numbered label opens a category whatever follows it. A bare label only
/// does when it ends the line or is followed by a colon, so body sentences
/// that merely start with a label (`確定病例之接觸者...`) stay body text.
#[derive(Debug)]
struct CaseMatcher {
    category: CaseCategory,
    marked: Regex,
    bare: Regex,
}

/// Re-parses the classification section into the three case-definition
/// categories.
#[derive(Debug)]
pub struct CaseClassifier {
    matchers: Vec<CaseMatcher>,
}

impl CaseClassifier {
    pub fn new() -> Result<Self> {
        let matchers = CASE_VOCABULARY
            .iter()
            .map(|(category, label)| {
                let escaped = regex::escape(label);
                let marked = Regex::new(&format!(
                    r"^{CASE_MARKER}\s*{escaped}\s*[：:]?\s*(?P<rest>.*)$"
                ))
                .with_context(|| format!("failed to compile case label regex for {label}"))?;
                let bare = Regex::new(&format!(r"^{escaped}\s*(?:[：:]\s*(?P<rest>.*))?$"))
                    .with_context(|| format!("failed to compile case label regex for {label}"))?;

                Ok(CaseMatcher {
                    category: *category,
                    marked,
                    bare,
                })
            })
            .collect::<Result<Vec<CaseMatcher>>>()?;

        Ok(Self { matchers })
    }

    pub fn classify(&self, classification_text: &str) -> CaseDefinitions {
        let blocks = classification_text
            .lines()
            .fold(HeadedLines::new(), |lines, raw_line| {
                let line = raw_line.trim();
                match self.detect_label(line) {
                    Some((category, rest)) => lines.open(category, Some(rest)),
                    None => lines.push(line),
                }
            })
            .finish();

        let mut definitions = CaseDefinitions::default();
        for (category, body) in blocks {
            definitions.set(category, body);
        }
        definitions
    }

    /// Returns the category and whatever follows the label on the same line.
    pub fn detect_label<'a>(&self, line: &'a str) -> Option<(CaseCategory, &'a str)> {
        self.matchers.iter().find_map(|matcher| {
            let captures = matcher
                .marked
                .captures(line)
                .or_else(|| matcher.bare.captures(line))?;
            let rest = captures.name("rest").map(|m| m.as_str()).unwrap_or("");
            Some((matcher.category, rest))
        })
    }
}
