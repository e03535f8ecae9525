use thiserror::Error;

/// The ways a [`Bridge`](crate::Bridge) can resolve other than with a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError<E> {
    /// The completion handler delivered an error. The value is passed through
    /// exactly as it was received.
    #[error("{0}")]
    Failed(E),
    /// The completion handler was called with neither a value nor an error.
    #[error("completion handler was called without a value or an error")]
    MissingResult,
    /// Every [`Resumer`](crate::Resumer) was dropped without being called.
    #[error("completion handler was dropped without being called")]
    Abandoned,
}

impl<E> BridgeError<E> {
    /// Check if this error was delivered by the completion handler.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Get a reference to the error delivered by the completion handler, if any.
    pub fn failed(&self) -> Option<&E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Unwrap the error delivered by the completion handler, if any.
    pub fn into_failed(self) -> Option<E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Transform the error delivered by the completion handler.
    pub fn map_failed<F, R>(self, f: F) -> BridgeError<R>
    where
        F: FnOnce(E) -> R,
    {
        match self {
            Self::Failed(err) => BridgeError::Failed(f(err)),
            Self::MissingResult => BridgeError::MissingResult,
            Self::Abandoned => BridgeError::Abandoned,
        }
    }
}
