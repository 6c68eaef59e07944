use anyhow::{Context, Result};
use regex::Regex;

/// Only the document head carries the title block.
const HEAD_LINE_COUNT: usize = 6;

const MIN_CANDIDATE_CHARS: usize = 3;
const MIN_FALLBACK_LINE_CHARS: usize = 4;
const ATTACHMENT_MARKER: &str = "附件";

#[derive(Debug)]
pub struct EnglishNameExtractor {
    numbered_line: Regex,
}

impl EnglishNameExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numbered_line: Regex::new(
                r"^(?:[一二三四五六七八九十壹貳參肆伍陸柒捌玖拾]+\s*[、.]|[0-9]+\s*[、.]|[（(][^）)]{1,3}[）)])",
            )
            .context("failed to compile numbered line regex")?,
        })
    }

    /// Finds the Latin-script disease name in the first lines of normalized
    /// text. Returns an empty string when nothing qualifies.
    pub fn extract(&self, text: &str) -> String {
        let head = text.lines().take(HEAD_LINE_COUNT).collect::<Vec<&str>>();

        self.from_parenthesized(&head.join("\n"))
            .or_else(|| self.from_standalone_line(&head))
            .unwrap_or_default()
    }

    fn from_parenthesized(&self, head: &str) -> Option<String> {
        parenthesized_spans(head)
            .into_iter()
            .map(collapse_whitespace)
            .find(|candidate| {
                candidate.chars().count() >= MIN_CANDIDATE_CHARS
                    && !contains_cjk_ideograph(candidate)
                    && candidate.chars().any(is_latin_letter)
            })
            .map(|candidate| to_ascii_punctuation(&candidate))
    }

    fn from_standalone_line(&self, head: &[&str]) -> Option<String> {
        head.iter()
            .map(|line| line.trim())
            .filter(|line| !self.numbered_line.is_match(line) && !line.contains(ATTACHMENT_MARKER))
            .find(|line| {
                let residue = line
                    .chars()
                    .filter(|character| {
                        !(is_latin_letter(*character)
                            || character.is_whitespace()
                            || matches!(*character, '-' | ',' | '，'))
                    })
                    .count();
                residue == 0 && line.chars().count() >= MIN_FALLBACK_LINE_CHARS
            })
            .map(to_ascii_punctuation)
    }
}

/// Contents of every closed bracket pair, outermost first: spans are ordered
/// by where they open, so an enclosing span precedes the ones nested in it.
/// Full-width and half-width brackets pair with each other freely.
fn parenthesized_spans(text: &str) -> Vec<&str> {
    let mut open = Vec::new();
    let mut spans = Vec::new();

    for (index, character) in text.char_indices() {
        match character {
            '（' | '(' => open.push(index + character.len_utf8()),
            '）' | ')' => {
                if let Some(start) = open.pop() {
                    spans.push((start, index));
                }
            }
            _ => {}
        }
    }

    spans.sort_by_key(|(start, _)| *start);
    spans.into_iter().map(|(start, end)| &text[start..end]).collect()
}

/// ASCII letters plus the accented Latin blocks (`é` in `Guillain-Barré`).
fn is_latin_letter(character: char) -> bool {
    character.is_ascii_alphabetic()
        || (character.is_alphabetic()
            && matches!(character, '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}'))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn contains_cjk_ideograph(value: &str) -> bool {
    value
        .chars()
        .any(|character| ('\u{4E00}'..='\u{9FFF}').contains(&character))
}

fn to_ascii_punctuation(value: &str) -> String {
    value.replace('，', ",").replace('：', ":")
}
