use std::convert::Infallible;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use super::core::Shared;
use super::error::BridgeError;
use super::misuse::{MisusePolicy, Unchecked};
use super::shape::Response;

/// The one-shot capability handed to a completion handler based API. Calling
/// any of the `resume` methods settles the corresponding
/// [`Bridge`](crate::Bridge) and wakes whoever is waiting on it.
///
/// A `Resumer` may be cloned and sent between threads, because many callback
/// APIs demand `Fn` closures. All clones share the same token: only the first
/// call to any of them is delivered. Later calls are rejected, and reported
/// when the bridge is [`Checked`](crate::Checked).
///
/// Dropping every clone without calling one settles the bridge with
/// [`BridgeError::Abandoned`].
pub struct Resumer<T, E = Infallible, M: MisusePolicy = Unchecked> {
    shared: Arc<Shared<T, E, M>>,
}

impl<T, E, M: MisusePolicy> Resumer<T, E, M> {
    pub(crate) fn new(shared: Arc<Shared<T, E, M>>) -> Self {
        shared.acquire_handle();
        Self { shared }
    }

    /// Settle the bridge with a result. Returns `true` if this call was the
    /// one delivered to the waiting side.
    pub fn resume(&self, result: Result<T, E>) -> bool {
        self.shared.settle(result.map_err(BridgeError::Failed))
    }

    /// Settle the bridge with a value.
    pub fn resume_returning(&self, value: T) -> bool {
        self.shared.settle(Ok(value))
    }

    /// Settle the bridge with an error.
    pub fn resume_throwing(&self, error: E) -> bool {
        self.shared.settle(Err(BridgeError::Failed(error)))
    }

    /// Settle the bridge from a value and an error which are both optional.
    /// See [`Response::into_result`] for the normalization applied.
    pub fn resume_optional(&self, value: Option<T>, error: Option<E>) -> bool {
        self.shared.settle(Response::new(value, error).into_result())
    }

    /// Check if the bridge has already been settled, by this resumer or a clone.
    pub fn is_settled(&self) -> bool {
        self.shared.is_settled()
    }

    /// Check if the waiting side has been dropped.
    pub fn is_discarded(&self) -> bool {
        self.shared.is_discarded()
    }

    /// The call-site label of a checked bridge.
    pub fn label(&self) -> Option<&str> {
        self.shared.policy().label()
    }
}

impl<T, E, M> Resumer<T, E, M>
where
    T: Send + 'static,
    E: Send + 'static,
    M: MisusePolicy,
{
    /// Create a completion handler accepting a `Result`.
    pub fn handler(&self) -> impl Fn(Result<T, E>) + Clone + Send + Sync + 'static {
        let resumer = self.clone();
        move |result: Result<T, E>| {
            resumer.resume(result);
        }
    }

    /// Create a completion handler accepting a bare value.
    pub fn returning_handler(&self) -> impl Fn(T) + Clone + Send + Sync + 'static {
        let resumer = self.clone();
        move |value: T| {
            resumer.resume_returning(value);
        }
    }

    /// Create a completion handler accepting an optional value and an
    /// optional error.
    pub fn optional_handler(&self) -> impl Fn(Option<T>, Option<E>) + Clone + Send + Sync + 'static {
        let resumer = self.clone();
        move |value: Option<T>, error: Option<E>| {
            resumer.resume_optional(value, error);
        }
    }
}

impl<T, E, M: MisusePolicy> Clone for Resumer<T, E, M> {
    fn clone(&self) -> Self {
        Self::new(self.shared.clone())
    }
}

impl<T, E, M: MisusePolicy> Drop for Resumer<T, E, M> {
    fn drop(&mut self) {
        self.shared.release_handle();
    }
}

impl<T, E, M: MisusePolicy> Debug for Resumer<T, E, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = if self.is_settled() {
            "Settled"
        } else if self.is_discarded() {
            "Discarded"
        } else {
            "Pending"
        };
        write!(f, "Resumer({})", state)
    }
}
