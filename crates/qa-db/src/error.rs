use std::path::PathBuf;

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("cannot open question store at {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Asked for the parent of a root reply.
    #[error("original reply has no parent")]
    NoParent,

    #[error("invalid parent reply: {0}")]
    InvalidParent(String),

    #[error("{0} has not been saved yet")]
    Unsaved(&'static str),

    #[error("database lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
