use std::convert::Infallible;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures_core::future::FusedFuture;

use super::core::{Outcome, Shared};
use super::error::BridgeError;
use super::misuse::{MisusePolicy, Unchecked};
use super::resumer::Resumer;
use super::thread::park_until;

/// The waiting side of a completion handler. It resolves once, to the
/// payload of the first call to its [`Resumer`], either with `.await` or by
/// parking the current thread.
///
/// Dropping a `Bridge` before it resolves is safe: the resumer stays valid,
/// and a late call to it simply drops the payload.
#[must_use = "Bridge must be awaited"]
pub struct Bridge<T, E = Infallible, M: MisusePolicy = Unchecked> {
    shared: Arc<Shared<T, E, M>>,
    terminated: bool,
}

impl<T, E, M: MisusePolicy> Bridge<T, E, M> {
    /// Create a bridge with a specific misuse policy. The `setup` function
    /// is called once, before returning, and must arrange for the resumer to
    /// be called exactly once.
    ///
    /// `setup` should register the resumer and return promptly. A `setup`
    /// that blocks the current thread until the resumer is called from the
    /// same thread will never return.
    pub fn with_policy<F>(policy: M, setup: F) -> Self
    where
        F: FnOnce(Resumer<T, E, M>),
    {
        let result = Self::try_with_policy(policy, |resumer| {
            setup(resumer);
            Result::<(), Infallible>::Ok(())
        });
        match result {
            Ok(bridge) => bridge,
            Err(never) => match never {},
        }
    }

    /// Create a bridge with a specific misuse policy and a fallible `setup`
    /// function. If `setup` fails, its error is returned immediately and any
    /// resumer that escaped it is disconnected: calling it is a no-op.
    ///
    /// A resumer called inside `setup` before it fails still reports the
    /// outcome as delivered, but nothing is waiting for it and the payload is
    /// dropped along with the bridge.
    pub fn try_with_policy<F, S>(policy: M, setup: F) -> Result<Self, S>
    where
        F: FnOnce(Resumer<T, E, M>) -> Result<(), S>,
    {
        let shared = Arc::new(Shared::new(policy));
        // hold a handle while setup runs, so that a failed setup is not
        // mistaken for a leaked resumer
        let guard = Resumer::new(shared.clone());
        // dropped before the guard, also when unwinding out of setup
        let bridge = Self {
            shared,
            terminated: false,
        };
        match setup(guard.clone()) {
            Ok(()) => {
                drop(guard);
                Ok(bridge)
            }
            Err(err) => {
                tracing::debug!(
                    label = bridge.label(),
                    "completion handler setup failed"
                );
                drop(bridge);
                drop(guard);
                Err(err)
            }
        }
    }

    /// Check if the bridge has already resolved.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Check if a resumer has been called (or all resumers were dropped).
    pub fn is_settled(&self) -> bool {
        self.shared.is_settled()
    }

    /// The call-site label of a checked bridge.
    pub fn label(&self) -> Option<&str> {
        self.shared.policy().label()
    }

    /// Take the outcome if it is already available, without registering
    /// for a wakeup.
    pub fn try_take(&mut self) -> Poll<Outcome<T, E>> {
        if self.terminated {
            return Poll::Pending;
        }
        let result = self.shared.try_take();
        self.terminated = result.is_ready();
        result
    }

    fn poll_outcome(&mut self, cx: &mut Context<'_>) -> Poll<Outcome<T, E>> {
        if self.terminated {
            return Poll::Pending;
        }
        let result = self.shared.poll(cx);
        self.terminated = result.is_ready();
        result
    }

    fn park(&mut self, expire: Option<Instant>) -> Poll<Outcome<T, E>> {
        park_until(|cx| self.poll_outcome(cx), expire)
    }

    /// Resolve the bridge, parking the current thread until the resumer is
    /// called.
    ///
    /// # Panics
    ///
    /// Panics if the bridge has already resolved.
    pub fn wait(mut self) -> Outcome<T, E> {
        assert!(!self.terminated, "Cannot block on terminated bridge");
        loop {
            // without a deadline, parking only returns once resolved
            if let Poll::Ready(outcome) = self.park(None) {
                break outcome;
            }
        }
    }

    /// Resolve the bridge, parking the current thread until the resumer is
    /// called or the deadline is reached. On timeout the original `Bridge`
    /// is returned, and may be waited on again or dropped.
    pub fn wait_deadline(mut self, expire: Instant) -> Result<Outcome<T, E>, Self> {
        if self.terminated {
            return Err(self);
        }
        match self.park(Some(expire)) {
            Poll::Ready(outcome) => Ok(outcome),
            Poll::Pending => Err(self),
        }
    }

    /// Resolve the bridge, parking the current thread until the resumer is
    /// called or the timeout expires. On timeout the original `Bridge` is
    /// returned. A timeout too large to be represented as a deadline waits
    /// indefinitely.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Outcome<T, E>, Self> {
        match Instant::now().checked_add(timeout) {
            Some(expire) => self.wait_deadline(expire),
            None if self.terminated => Err(self),
            None => Ok(self.wait()),
        }
    }
}

impl<T, E, M: MisusePolicy> Bridge<T, E, M> {
    /// Transform the value delivered by the resumer.
    pub fn map_ok<R, F>(self, f: F) -> MapOk<T, E, M, F>
    where
        F: FnOnce(T) -> R,
    {
        MapOk {
            bridge: self,
            f: Some(f),
        }
    }
}

impl<T, E, M: MisusePolicy> Debug for Bridge<T, E, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("label", &self.label())
            .field("settled", &self.is_settled())
            .field("terminated", &self.terminated)
            .finish()
    }
}

impl<T, E, M: MisusePolicy> Drop for Bridge<T, E, M> {
    fn drop(&mut self) {
        self.shared.discard();
    }
}

impl<T, E, M: MisusePolicy> Future for Bridge<T, E, M> {
    type Output = Outcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().poll_outcome(cx)
    }
}

impl<T, E, M: MisusePolicy> FusedFuture for Bridge<T, E, M> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// Created by [`Bridge::map_ok`].
#[must_use = "MapOk must be awaited"]
pub struct MapOk<T, E, M: MisusePolicy, F> {
    bridge: Bridge<T, E, M>,
    f: Option<F>,
}

impl<T, E, M: MisusePolicy, F> Unpin for MapOk<T, E, M, F> {}

impl<T, E, M: MisusePolicy, F> Debug for MapOk<T, E, M, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapOk")
            .field("bridge", &self.bridge)
            .finish()
    }
}

impl<T, E, M, F, R> FusedFuture for MapOk<T, E, M, F>
where
    M: MisusePolicy,
    F: FnOnce(T) -> R,
{
    fn is_terminated(&self) -> bool {
        self.f.is_none()
    }
}

impl<T, E, M, F, R> Future for MapOk<T, E, M, F>
where
    M: MisusePolicy,
    F: FnOnce(T) -> R,
{
    type Output = Result<R, BridgeError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.bridge).poll(cx) {
            Poll::Ready(result) => match this.f.take() {
                Some(f) => Poll::Ready(result.map(f)),
                None => Poll::Pending,
            },
            Poll::Pending => Poll::Pending,
        }
    }
}
