use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Call-graph slice computed for one entry point by an external engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallgraphSlice {
    /// Free-form summary, copied into the bundle verbatim
    pub summary: String,

    /// Source ranges the slice touches, in engine order
    #[serde(default)]
    pub anchors: Vec<SliceAnchor>,
}

impl CallgraphSlice {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            anchors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_anchor(mut self, file: impl Into<PathBuf>, start_line: usize, end_line: usize) -> Self {
        self.anchors.push(SliceAnchor {
            file: file.into(),
            start_line,
            end_line,
        });
        self
    }
}

/// Inclusive, 1-indexed line range in a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceAnchor {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

impl SliceAnchor {
    /// Range clamped to a file of `line_count` lines, `None` when nothing remains
    #[must_use]
    pub fn clamp(&self, line_count: usize) -> Option<(usize, usize)> {
        let start = self.start_line.max(1);
        let end = self.end_line.min(line_count);
        (start <= end).then_some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_file_bounds() {
        let anchor = SliceAnchor {
            file: PathBuf::from("A.java"),
            start_line: 0,
            end_line: 99,
        };
        assert_eq!(anchor.clamp(10), Some((1, 10)));

        let past_end = SliceAnchor {
            start_line: 20,
            end_line: 30,
            ..anchor.clone()
        };
        assert_eq!(past_end.clamp(10), None);

        let reversed = SliceAnchor {
            start_line: 5,
            end_line: 3,
            ..anchor
        };
        assert_eq!(reversed.clamp(10), None);
    }

    #[test]
    fn deserializes_without_anchors() {
        let slice: CallgraphSlice = serde_json::from_str(r#"{"summary": "a -> b"}"#).unwrap();
        assert_eq!(slice, CallgraphSlice::new("a -> b"));
    }
}
