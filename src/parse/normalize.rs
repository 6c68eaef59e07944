use unicode_normalization::UnicodeNormalization;

/// Run length at which a repeated glyph is treated as a duplication artifact.
const DUPLICATE_RUN_LENGTH: usize = 4;

const PUNCTUATION_WIDTH_MAP: [(char, char); 7] = [
    (',', '，'),
    (':', '：'),
    (';', '；'),
    ('!', '！'),
    ('?', '？'),
    ('(', '（'),
    (')', '）'),
];

/// Canonicalizes extracted text: NFKC, full-width CJK punctuation, and
/// collapsing of the 4x glyph duplication some PDF text layers produce.
///
/// Total over any input and idempotent.
pub fn normalize(text: &str) -> String {
    let canonical = text.nfkc().map(widen_punctuation).collect::<Vec<char>>();

    let mut collapsed = collapse_duplicate_runs(&canonical, DUPLICATE_RUN_LENGTH);
    // a collapsed run can still be a full run (16 copies -> 4)
    loop {
        let next = collapse_duplicate_runs(&collapsed, DUPLICATE_RUN_LENGTH);
        if next.len() == collapsed.len() {
            break;
        }
        collapsed = next;
    }

    collapsed.into_iter().collect()
}

fn widen_punctuation(character: char) -> char {
    PUNCTUATION_WIDTH_MAP
        .iter()
        .find(|(narrow, _)| *narrow == character)
        .map(|(_, wide)| *wide)
        .unwrap_or(character)
}

fn collapse_duplicate_runs(chars: &[char], run_length: usize) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut index = 0usize;

    while index < chars.len() {
        let current = chars[index];
        let is_run = run_length > 1
            && index + run_length <= chars.len()
            && chars[index..index + run_length]
                .iter()
                .all(|character| *character == current);

        out.push(current);
        index += if is_run { run_length } else { 1 };
    }

    out
}
