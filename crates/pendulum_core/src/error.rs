use thiserror::Error;

/// Contract violations raised by the vector and matrix types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlgebraError {
    #[error("Vector of size {actual}, wanted size {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector length must be > 0")]
    EmptyVector,

    #[error("Setting .{component} of vector of length {len}")]
    MissingComponent { component: char, len: usize },

    #[error("Attempt to normalise null vector")]
    NullVector,

    #[error("Rotations for vectors of dimension {0} not supported")]
    UnsupportedRotation(usize),

    #[error("Matrix must be initialised with array of length N^2, got {0}")]
    NotSquare(usize),

    #[error("Invalid matrix indices ({row}, {col}) for size {size}")]
    IndexOutOfRange { row: usize, col: usize, size: usize },

    #[error("Matrix size must be > 0")]
    InvalidSize,
}
