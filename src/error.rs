// src/error.rs

use thiserror::Error;

/// A thread-safe boxed error, as returned by the linear algebra backends.
pub type ThreadSafeStdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used by every public operation in this crate.
pub type Result<T> = std::result::Result<T, SpectralError>;

/// Every failure the cube helpers and the PCA engine can report.
#[derive(Error, Debug)]
pub enum SpectralError {
    /// An array had the wrong number of dimensions, or no elements where some are required.
    #[error("{context}: expected {expected}, found {found}.")]
    Shape {
        context: &'static str,
        expected: String,
        found: String,
    },

    #[error("Requested {requested} principal components, but this model supports 1..={available}.")]
    ComponentCount { requested: usize, available: usize },

    #[error("Wavelength array does not bracket the {channel} target of {target_nm} nm; it does not cover the visible range needed for an RGB composite.")]
    WavelengthCoverage { channel: &'static str, target_nm: f64 },

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("{context}: lengths disagree ({left} vs {right}).")]
    LengthMismatch {
        context: &'static str,
        left: usize,
        right: usize,
    },

    #[error("Pixel ({row}, {col}) is outside the {rows} x {cols} spatial extent of the cube.")]
    PixelOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Matrix product with inner dimensions that do not agree.
    #[error("Cannot multiply a {lhs:?} matrix by a {rhs:?} matrix: inner dimensions differ.")]
    IncompatibleProduct { lhs: (usize, usize), rhs: (usize, usize) },

    #[error("Linear algebra backend failed: {0}")]
    Backend(ThreadSafeStdError),

    #[error("Plotting surface failed: {0}")]
    Surface(ThreadSafeStdError),

    #[error("Failed to encode PCA model: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode PCA model: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

impl SpectralError {
    pub(crate) fn rank(context: &'static str, expected: usize, found: usize) -> Self {
        SpectralError::Shape {
            context,
            expected: format!("{}-dimensional array", expected),
            found: format!("{} dimension(s)", found),
        }
    }

    pub(crate) fn empty(context: &'static str, found: &[usize]) -> Self {
        SpectralError::Shape {
            context,
            expected: "a non-empty array".to_string(),
            found: format!("shape {:?}", found),
        }
    }
}
