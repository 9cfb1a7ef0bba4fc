use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("XML error at byte {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("Corpus error: {0}")]
    Corpus(#[from] entrypack_corpus::CorpusError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
