use derive_more::From;

use super::model::IdKind;
use super::subscription::PatternError;

#[derive(From, thiserror::Error, Debug)]
pub enum Error {
    #[error("Serde Json Error")]
    SerdeJson(serde_json::Error),

    #[error("Invalid subscription pattern: {pattern}")]
    #[from(ignore)]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("{0} is not initialized")]
    #[from(ignore)]
    NotInitialized(&'static str),

    #[error("Invalid value {value:?} for {key}")]
    #[from(ignore)]
    Config { key: String, value: String },

    #[error("Invalid id: {0}")]
    #[from(ignore)]
    InvalidId(String),

    #[error("Expected an id of kind {expected}, got {actual} id {id}")]
    #[from(ignore)]
    IdKindMismatch {
        expected: IdKind,
        id: String,
        actual: IdKind,
    },
}

pub type Result<A, E = Error> = std::result::Result<A, E>;
