/// Buffer-and-flush state shared by the section segmenter and the case
/// classifier. Each step consumes the accumulator and returns the next one,
/// so a whole document is a single `fold` over its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FoldState<K> {
    Idle,
    Open(K),
}

#[derive(Debug)]
pub(crate) struct HeadedLines<K> {
    state: FoldState<K>,
    buffer: Vec<String>,
    flushed: Vec<(K, String)>,
}

impl<K: Copy> HeadedLines<K> {
    pub(crate) fn new() -> Self {
        Self {
            state: FoldState::Idle,
            buffer: Vec::new(),
            flushed: Vec::new(),
        }
    }

    /// Closes the open block (if any) and opens `key`, optionally seeding the
    /// new buffer with text found on the header line itself.
    pub(crate) fn open(mut self, key: K, seed: Option<&str>) -> Self {
        self.flush();
        self.state = FoldState::Open(key);
        if let Some(seed) = seed.map(str::trim).filter(|seed| !seed.is_empty()) {
            self.buffer.push(seed.to_string());
        }
        self
    }

    /// Lines outside any block are dropped.
    pub(crate) fn push(mut self, line: &str) -> Self {
        if matches!(self.state, FoldState::Open(_)) {
            self.buffer.push(line.to_string());
        }
        self
    }

    /// Flushed blocks in document order. A key opened twice appears twice.
    pub(crate) fn finish(mut self) -> Vec<(K, String)> {
        self.flush();
        self.flushed
    }

    fn flush(&mut self) {
        if let FoldState::Open(key) = self.state {
            let body = self.buffer.join("\n").trim().to_string();
            self.flushed.push((key, body));
        }
        self.buffer.clear();
    }
}
