//! Error types for the inference engine.
//!
//! All failures are precondition/postcondition violations checked at the
//! suite boundary; there are no retry semantics. Monte-Carlo estimation has
//! no transient failure mode other than numerical degeneracy, which is
//! surfaced as a hard error rather than silently treated as uniform.

use thiserror::Error;

/// Result type alias for Species Census operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the inference engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The candidate range cannot cover the observed data, or is malformed.
    #[error("invalid candidate range: {0}")]
    InvalidRange(String),

    /// A weight vector summed to zero or non-finite after an update.
    #[error("degenerate normalization: {0}")]
    DegenerateNormalization(String),

    /// Invalid shape parameters reached a sampler or marginal extraction.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// Restricted-sampling peek protocol violated.
    #[error("restricted sampler misuse: peeked {0}")]
    PeekContract(&'static str),

    /// Category query beyond the hypothesis it was asked of.
    #[error("category index {index} out of range for N = {limit}")]
    IndexOutOfRange { index: usize, limit: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_condition() {
        let err = Error::InvalidRange("candidate N = 2 is below 3 observed categories".into());
        assert!(err.to_string().contains("invalid candidate range"));

        let err = Error::IndexOutOfRange { index: 5, limit: 3 };
        assert!(err.to_string().contains("index 5"));
        assert!(err.to_string().contains("N = 3"));
    }
}
