//! Error types for the pickupcal engine.

use thiserror::Error;

/// Errors that can occur in pickupcal operations.
///
/// "Nothing matched" outcomes of deletions and duplicate adds are normal
/// `false`/`0` return values on the calendar API, never errors.
#[derive(Error, Debug)]
pub enum PickupError {
    /// Out-of-range day, week number, or zero selector value. Callers
    /// validate input before reaching the engine, so hitting this indicates
    /// a bug upstream or corrupted stored state.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid event name: {0:?}")]
    InvalidName(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    /// A bounded occurrence search came up empty. Week numbers are capped at
    /// ±5 and always satisfiable within a year, so this is a contract
    /// violation rather than a user error.
    #[error("No occurrence found: {0}")]
    NotFound(String),
}

/// Result type alias for pickupcal operations.
pub type PickupResult<T> = Result<T, PickupError>;
