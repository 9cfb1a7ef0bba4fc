use entrypack_corpus::SourceText;

/// Appended after a bundle cut at its character budget
pub const TRUNCATION_MARKER: &str = "\n... [truncated]\n";

/// Line-oriented text buffer that tracks its size in characters against a budget.
///
/// Writers check [`BundleText::is_full`] between lines; [`BundleText::finish`]
/// cuts whatever overshoots at the tail.
#[derive(Debug)]
pub(crate) struct BundleText {
    buf: String,
    chars: usize,
    budget: usize,
    stopped: bool,
}

impl BundleText {
    pub(crate) const fn new(budget: usize) -> Self {
        Self {
            buf: String::new(),
            chars: 0,
            budget,
            stopped: false,
        }
    }

    pub(crate) const fn is_full(&self) -> bool {
        self.chars >= self.budget
    }

    fn push(&mut self, text: &str) {
        self.chars += text.chars().count();
        self.buf.push_str(text);
    }

    pub(crate) fn line(&mut self, text: &str) {
        self.push(text);
        self.push("\n");
    }

    pub(crate) fn blank(&mut self) {
        self.push("\n");
    }

    /// One source line behind a fixed-width line number gutter
    pub(crate) fn numbered(&mut self, number: usize, text: &str) {
        self.push(&format!("{number:>6} | "));
        self.line(text);
    }

    /// Lines `start..=end` (1-indexed) of `source`, missing lines rendered empty.
    ///
    /// With `budgeted`, stops before the next line once the budget is used up.
    /// Returns `false` when it stopped early.
    pub(crate) fn excerpt(&mut self, source: &SourceText, start: usize, end: usize, budgeted: bool) -> bool {
        for number in start..=end {
            if budgeted && self.is_full() {
                self.stopped = true;
                return false;
            }
            let text = number
                .checked_sub(1)
                .and_then(|index| source.line(index))
                .unwrap_or("");
            self.numbered(number, text);
        }
        true
    }

    /// Final text, cut to exactly the budget plus the marker when over it.
    ///
    /// An excerpt that stopped early also gets the marker.
    pub(crate) fn finish(self) -> String {
        if self.chars <= self.budget && !self.stopped {
            return self.buf;
        }
        let cut = self
            .buf
            .char_indices()
            .nth(self.budget)
            .map_or(self.buf.len(), |(index, _)| index);
        let mut text = self.buf;
        text.truncate(cut);
        text.push_str(TRUNCATION_MARKER);
        text
    }
}
