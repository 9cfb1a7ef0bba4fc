use thiserror::Error;

pub type Result<T> = std::result::Result<T, BundleError>;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corpus error: {0}")]
    Corpus(#[from] entrypack_corpus::CorpusError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid bundle path: {0}")]
    InvalidPath(String),
}
