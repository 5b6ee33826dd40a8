use thiserror::Error;

/// Failures of [`Dictionary`](crate::Dictionary) operations whose
/// preconditions were not met. None of them leave the dictionary modified.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryError {
    /// The key passed to `get_value`/`remove` is not stored.
    #[error("missing key -> {op}()")]
    MissingKey { op: &'static str },
    /// The cursor is undefined.
    #[error("no current element -> {op}()")]
    NoCurrent { op: &'static str },
}

pub type Result<T, E = DictionaryError> = std::result::Result<T, E>;
