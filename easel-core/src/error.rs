//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Element not found in the session.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An element with the same ID is already placed in the session.
    #[error("Duplicate element id: {0}")]
    DuplicateElement(String),

    /// Operation is not valid for this element type.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),
}
