//! Error handling and result types for QuickList operations.
//!
//! Caller mistakes (bad indices, stale entries) come back as typed errors and
//! never leave the list half-modified. Structural invariant breaks are core
//! bugs: mutation paths guard them with `debug_assert!`, while the validator
//! and dangling-node lookups report them as `PolicyViolation`.

use thiserror::Error;

/// Error type for QuickList operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuickListError {
    /// Index outside `-len..len`.
    #[error("index {index} out of range for list of {len} entries")]
    IndexOutOfRange { index: i64, len: usize },

    /// The entry was located before a later mutation of the list.
    #[error("stale entry: list was modified after the entry was located")]
    StaleEntry,

    /// An iterator was asked to delete an entry it did not yield last.
    #[error("entry is not the iterator's current element")]
    NotCurrentEntry,

    /// Rejected configuration value.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// A byte blob does not parse as a packed run.
    #[error("corrupted packed run: {0}")]
    CorruptedRun(String),

    /// The compressor could not invert its own output.
    #[error("compression error: {0}")]
    Compression(String),

    /// A structural invariant does not hold.
    #[error("policy violation: {0}")]
    PolicyViolation(String),
}

impl QuickListError {
    /// Create an IndexOutOfRange error.
    pub fn index_out_of_range(index: i64, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create an InvalidOption error with context.
    pub fn invalid_option(option: &str, details: &str) -> Self {
        Self::InvalidOption(format!("{}: {}", option, details))
    }

    /// Create a CorruptedRun error with the byte position that failed to parse.
    pub fn corrupted_run(position: usize, details: &str) -> Self {
        Self::CorruptedRun(format!("at byte {}: {}", position, details))
    }

    /// Create a Compression error with context.
    pub fn compression(operation: &str, details: &str) -> Self {
        Self::Compression(format!("{} failed: {}", operation, details))
    }

    /// Create a PolicyViolation error naming the offending node.
    pub fn policy_violation(node_id: u32, details: &str) -> Self {
        Self::PolicyViolation(format!("node {}: {}", node_id, details))
    }

    /// True for errors caused by a bad index, entry or iterator position.
    pub fn is_position_error(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::StaleEntry | Self::NotCurrentEntry
        )
    }

    /// True for errors that indicate a bug in the list itself.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::PolicyViolation(_) | Self::Compression(_))
    }
}

/// Public result type for list operations that may fail
pub type QuickListResult<T> = Result<T, QuickListError>;

/// Result type for list modification operations
pub type ModifyResult<T> = Result<T, QuickListError>;

/// Result type for list construction and option changes
pub type InitResult<T> = Result<T, QuickListError>;

/// Result extension trait for adding operation context
pub trait ResultExt<T> {
    /// Prefix a message-carrying error with the name of the failing operation.
    fn with_context(self, context: &str) -> QuickListResult<T>;
}

impl<T> ResultExt<T> for Result<T, QuickListError> {
    fn with_context(self, context: &str) -> QuickListResult<T> {
        self.map_err(|e| match e {
            QuickListError::InvalidOption(msg) => {
                QuickListError::InvalidOption(format!("{}: {}", context, msg))
            }
            QuickListError::CorruptedRun(msg) => {
                QuickListError::CorruptedRun(format!("{}: {}", context, msg))
            }
            QuickListError::Compression(msg) => {
                QuickListError::Compression(format!("{}: {}", context, msg))
            }
            QuickListError::PolicyViolation(msg) => {
                QuickListError::PolicyViolation(format!("{}: {}", context, msg))
            }
            other => other,
        })
    }
}
