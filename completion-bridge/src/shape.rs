//! Payload shapes accepted by a [`Resumer`].
//!
//! Every shape is normalized into the same `Result<T, BridgeError<E>>`
//! outcome, so one state machine serves them all:
//!
//! - `Result<T, E>`: [`Resumer::resume`]
//! - a bare value or error: [`Resumer::resume_returning`],
//!   [`Resumer::resume_throwing`]
//! - a value and an error which are both optional:
//!   [`Resumer::resume_optional`], normalized by [`Response::into_result`]
//! - several positional values, when `T` is a tuple of arity 2 to 6:
//!   `Resumer::resume_values`

use super::error::BridgeError;
use super::misuse::MisusePolicy;
use super::resumer::Resumer;

/// The arguments of a completion handler which reports a value and an error
/// as two independent optionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T, E> {
    pub value: Option<T>,
    pub error: Option<E>,
}

impl<T, E> Response<T, E> {
    pub fn new(value: Option<T>, error: Option<E>) -> Self {
        Self { value, error }
    }

    /// Normalize the response: an error always wins, even when a value is
    /// also present. A response with neither is `MissingResult`.
    pub fn into_result(self) -> Result<T, BridgeError<E>> {
        match (self.value, self.error) {
            (_, Some(err)) => Err(BridgeError::Failed(err)),
            (Some(value), None) => Ok(value),
            (None, None) => Err(BridgeError::MissingResult),
        }
    }

    /// Keep whatever value was delivered, and fail if an error was delivered.
    pub fn split(self) -> (Option<T>, Result<(), E>) {
        let result = match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        };
        (self.value, result)
    }

    pub fn into_parts(self) -> (Option<T>, Option<E>) {
        (self.value, self.error)
    }
}

impl<T, E> From<(Option<T>, Option<E>)> for Response<T, E> {
    fn from((value, error): (Option<T>, Option<E>)) -> Self {
        Self::new(value, error)
    }
}

impl<T, E, F, M: MisusePolicy> Resumer<Response<T, E>, F, M> {
    /// Deliver both halves of a response without normalizing them.
    pub fn resume_response(&self, value: Option<T>, error: Option<E>) -> bool {
        self.resume_returning(Response::new(value, error))
    }

    /// Create a completion handler which delivers both halves of a response.
    pub fn response_handler(&self) -> impl Fn(Option<T>, Option<E>) + Clone + Send + Sync + 'static
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Send + 'static,
    {
        let resumer = self.clone();
        move |value: Option<T>, error: Option<E>| {
            resumer.resume_response(value, error);
        }
    }
}

macro_rules! positional_resumer {
    ($($ty:ident $arg:ident),+) => {
        impl<$($ty,)+ E, M: MisusePolicy> Resumer<($($ty,)+), E, M> {
            /// Deliver positional values as a tuple.
            pub fn resume_values(&self, $($arg: $ty),+) -> bool {
                self.resume_returning(($($arg,)+))
            }

            /// Create a completion handler taking positional values.
            pub fn values_handler(&self) -> impl Fn($($ty),+) + Clone + Send + Sync + 'static
            where
                $($ty: Send + 'static,)+
                E: Send + 'static,
            {
                let resumer = self.clone();
                move |$($arg: $ty),+| {
                    resumer.resume_values($($arg),+);
                }
            }
        }
    };
}

positional_resumer!(T1 v1, T2 v2);
positional_resumer!(T1 v1, T2 v2, T3 v3);
positional_resumer!(T1 v1, T2 v2, T3 v3, T4 v4);
positional_resumer!(T1 v1, T2 v2, T3 v3, T4 v4, T5 v5);
positional_resumer!(T1 v1, T2 v2, T3 v3, T4 v4, T5 v5, T6 v6);
