use std::error::Error;
use std::fmt::Display;

/// An error raised while declaring the ports of a multiport memory or building it.
///
/// All errors are fatal to the call that raised them; nothing is left half-declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The shape, depth, initial contents or port widths are invalid.
    Configuration(String),
    /// A port was declared, or the memory was built, after the memory has been built.
    Lifecycle(String),
    /// More write ports were requested than the memory supports.
    Capacity(String),
    /// The declared ports or the built topology are inconsistent.  This indicates a bug in this crate
    /// rather than misuse by the caller.
    InternalInvariant(String),
}

impl MemoryError {
    pub(crate) fn configuration(message: impl Into<String>) -> MemoryError {
        MemoryError::Configuration(message.into())
    }

    pub(crate) fn lifecycle(message: impl Into<String>) -> MemoryError {
        MemoryError::Lifecycle(message.into())
    }

    pub(crate) fn capacity(message: impl Into<String>) -> MemoryError {
        MemoryError::Capacity(message.into())
    }

    pub(crate) fn internal_invariant(message: impl Into<String>) -> MemoryError {
        MemoryError::InternalInvariant(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, MemoryError::Configuration(_))
    }

    pub fn is_lifecycle(&self) -> bool {
        matches!(self, MemoryError::Lifecycle(_))
    }

    pub fn is_capacity(&self) -> bool {
        matches!(self, MemoryError::Capacity(_))
    }
}

impl Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::Configuration(message) => write!(f, "invalid memory configuration: {message}"),
            MemoryError::Lifecycle(message) => write!(f, "memory already built: {message}"),
            MemoryError::Capacity(message) => write!(f, "memory port capacity exceeded: {message}"),
            MemoryError::InternalInvariant(message) => write!(f, "internal invariant violated: {message}"),
        }
    }
}

impl Error for MemoryError {}
