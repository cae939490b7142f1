//! Errors returned by the catalog collaborators of the streaming engine.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nothing with that id is visible to the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store could not answer.
    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage(reason.into())
    }

    /// A missing entity, as opposed to a lookup that failed outright.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
