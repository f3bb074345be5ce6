//! Run outcomes and the errors a property predicate can raise.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Error raised while running a property predicate
#[derive(Debug, Clone, Error)]
pub enum PropertyError {
    /// The predicate disproved the property
    #[error("Property failed: {message}{}", context_suffix(.context))]
    PropertyFailed {
        message: String,
        context: Option<String>,
    },

    /// A precondition did not hold: the input is discarded, not failed
    #[error("Precondition failed")]
    PreconditionFailed { interrupt: bool },

    /// The predicate panicked
    #[error("Property panicked: {message}")]
    Panicked { message: String },

    /// An asynchronous predicate did not settle in time
    #[error("Property timeout: exceeded limit of {} milliseconds", millis(.limit))]
    Timeout { limit: Duration },

    /// Any other error reported by the predicate
    #[error("{0}")]
    Custom(Arc<dyn StdError + Send + Sync>),
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(ctx) => format!(" (context: {})", ctx),
        None => String::new(),
    }
}

fn millis(limit: &Duration) -> u128 {
    limit.as_millis()
}

impl PropertyError {
    /// Create a simple property failed error
    pub fn property_failed(message: impl Into<String>) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            context: None,
        }
    }

    /// Create a property failed error with context
    pub fn property_failed_with_context(
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Wrap an arbitrary error raised by the predicate
    pub fn custom<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(error))
    }

    pub(crate) fn panicked(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }

    /// Whether this error is the precondition sentinel rather than a failure
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}

/// Discard the current input unless `condition` holds.
///
/// Meant to be used with `?` inside predicates returning
/// `Result<_, PropertyError>`:
///
/// ```rust
/// use falsify::{pre, PropertyError};
///
/// fn even_halves(n: &u32) -> Result<bool, PropertyError> {
///     pre(n % 2 == 0)?;
///     Ok((n / 2) * 2 == *n)
/// }
///
/// assert!(even_halves(&3).unwrap_err().is_precondition());
/// assert!(even_halves(&4).unwrap());
/// ```
pub fn pre(condition: bool) -> Result<(), PropertyError> {
    if condition {
        Ok(())
    } else {
        Err(PropertyError::PreconditionFailed { interrupt: false })
    }
}

/// Failure payload: the original error plus a best-effort message
#[derive(Debug, Clone)]
pub struct PropertyFailure {
    pub error: PropertyError,
    pub message: String,
}

impl PropertyFailure {
    pub fn new(error: PropertyError) -> Self {
        let message = error.to_string();
        Self { error, message }
    }
}

impl From<PropertyError> for PropertyFailure {
    fn from(error: PropertyError) -> Self {
        Self::new(error)
    }
}

/// Result of running a predicate against one input
#[derive(Debug, Clone)]
pub enum Outcome {
    Success,
    /// Input discarded. `interrupt` stops the whole run.
    Skip { interrupt: bool },
    Failure(PropertyFailure),
}

impl Outcome {
    pub fn skip() -> Self {
        Self::Skip { interrupt: false }
    }

    pub fn interrupt() -> Self {
        Self::Skip { interrupt: true }
    }

    pub fn failure(error: PropertyError) -> Self {
        Self::Failure(PropertyFailure::new(error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl From<Result<(), PropertyError>> for Outcome {
    fn from(result: Result<(), PropertyError>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(PropertyError::PreconditionFailed { interrupt }) => Outcome::Skip { interrupt },
            Err(error) => Outcome::failure(error),
        }
    }
}
