//! Error types and reporting.

mod error;

pub use error::TransposeError;
