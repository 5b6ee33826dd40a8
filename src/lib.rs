#![forbid(unsafe_code)]

// the ordered dictionary itself
pub mod dictionary;
pub mod error;

// front ends
pub mod logging;
pub mod text;

pub use dictionary::{Dictionary, InvariantViolation};
pub use error::{DictionaryError, Result};
