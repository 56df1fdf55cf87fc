//! Error types for arbortree.

use crate::common::NodeId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid, missing or out-of-range input, caught before any mutation.
    Argument,
    /// Allocation failed. The failing call has already unwound its partial work.
    Memory,
    /// Everything else: missing values, invalid state, corruption.
    Runtime,
}

/// All possible errors in arbortree.
///
/// A callee's error is wrapped in [`Error::Context`] by each call site that
/// adds information, so the full causal path stays inspectable through
/// [`std::error::Error::source`] or [`Error::chain`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument was invalid (zero threshold, out-of-range index, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The node arena has no free slot left.
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// A node is in the wrong state for the operation.
    ///
    /// Typically a node that is still linked where an unlinked one is
    /// required, or the reverse.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A value that should exist was not found.
    #[error("value missing: {0}")]
    ValueMissing(String),

    /// A value that should be unset was already set.
    #[error("value already set: {0}")]
    AlreadySet(String),

    /// A structural invariant was found broken.
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// The handle refers to a freed (or never allocated) node.
    #[error("stale node handle: {0}")]
    StaleNode(NodeId),

    /// A caller-supplied comparator failed.
    #[error("comparison failed: {0}")]
    Comparison(String),

    /// A caller-supplied clone function failed.
    #[error("clone failed: {0}")]
    CloneFailed(String),

    /// A callee's error with added context.
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with context.
    pub fn context(self, message: impl Into<String>) -> Self {
        Error::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error of the chain.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Iterate the chain from this error down to its root cause.
    pub fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = match current {
                Error::Context { source, .. } => Some(source),
                _ => None,
            };
            Some(current)
        })
    }

    /// Classify the root cause.
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Error::InvalidArgument(_) => ErrorKind::Argument,
            Error::Allocation(_) => ErrorKind::Memory,
            _ => ErrorKind::Runtime,
        }
    }
}

/// Extension for adding context to a `Result`.
pub trait ResultExt<T> {
    /// Wrap the error, if any, with a fixed message.
    fn context(self, message: &str) -> Result<T>;

    /// Wrap the error, if any, with a lazily built message.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, message: &str) -> Result<T> {
        self.map_err(|e| e.context(message))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}
