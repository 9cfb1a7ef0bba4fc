use thiserror::Error;

/// Result type for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Errors raised by the corpus layer
#[derive(Error, Debug)]
pub enum CorpusError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tree-sitter could not be initialised or failed to parse
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// The live corpus handle cannot hand out a snapshot
    #[error("Corpus unavailable: {0}")]
    Unavailable(String),

    /// Invalid corpus root
    #[error("Invalid corpus root: {0}")]
    InvalidRoot(String),
}

impl CorpusError {
    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
