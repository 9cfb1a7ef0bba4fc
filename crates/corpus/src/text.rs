/// File content with a line index for offset ↔ line mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    content: String,
    /// Byte offset where each line starts (line 0 starts at 0)
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut line_starts = vec![0];
        for (idx, byte) in content.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            content,
            line_starts,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Number of lines (a trailing newline opens an empty last line)
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 0-based line containing the byte offset; offsets past the end map to the last line
    #[must_use]
    pub fn line_of_offset(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert_at) => insert_at.saturating_sub(1),
        }
    }

    /// Text of a 0-based line without its terminator
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.content.len(), |next| next - 1);
        let line = &self.content[start..end];
        Some(line.strip_suffix('\r').unwrap_or(line))
    }
}
