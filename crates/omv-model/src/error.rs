use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid external id: {0:?}")]
    InvalidExternalId(String),
    #[error("invalid source name: {0:?}")]
    InvalidSourceName(String),
    #[error("invalid form name: {0:?}")]
    InvalidFormName(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
}
