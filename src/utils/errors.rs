use std::error::Error;
use std::fmt;

/**
 * Error taxonomy for the positional assembly subsystem.
 *
 * Invariant violations are fatal and terminate the contig stream.
 * Soft inconsistencies are logged by the assembler, which then attempts to
 * make forward progress. Configuration failures are raised at construction
 * time, before any input is consumed.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    InvariantViolation(String),
    SoftInconsistency(String),
    ConfigurationFailure(String),
}

impl AssemblyError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AssemblyError::SoftInconsistency(_))
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::InvariantViolation(msg) => {
                write!(f, "Invariant violation: {}", msg)
            }
            AssemblyError::SoftInconsistency(msg) => {
                write!(f, "Soft inconsistency: {}", msg)
            }
            AssemblyError::ConfigurationFailure(msg) => {
                write!(f, "Configuration failure: {}", msg)
            }
        }
    }
}

impl Error for AssemblyError {}
