use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Build-time failures. Queries never fail; see [`crate::Retrieval`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// IDF is undefined without documents.
    #[error("corpus contains no documents")]
    EmptyCorpus,
    #[error("duplicate document id `{0}`")]
    DuplicateDocument(String),
    #[error("posting depth must be at least 1")]
    InvalidDepth,
    #[error("failed to read corpus path {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}
