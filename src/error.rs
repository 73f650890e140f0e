use core::fmt;

/// Result alias for `modal`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the spatial index and the mode-seeking engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Point dimension mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A seed trajectory produced a non-finite position.
    NonFinite {
        /// Index of the failing seed.
        seed: usize,
    },

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::NonFinite { seed } => {
                write!(f, "seed {seed} produced a non-finite position")
            }
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
