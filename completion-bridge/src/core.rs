use std::cell::UnsafeCell;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures_util::task::AtomicWaker;

use super::error::BridgeError;
use super::misuse::{MisuseKind, MisusePolicy};

const PENDING: u8 = 0b000;
// set by the single winner of the pending -> settled transition
const CLAIMED: u8 = 0b001;
// set once the winner has written the outcome
const STORED: u8 = 0b010;
// set when the waiting side goes away
const DISCARDED: u8 = 0b100;

pub(crate) type Outcome<T, E> = Result<T, BridgeError<E>>;

/// The suspension token shared between a `Bridge` and its `Resumer`s.
pub(crate) struct Shared<T, E, M> {
    state: AtomicU8,
    handles: AtomicUsize,
    data: UnsafeCell<Option<Outcome<T, E>>>,
    waker: AtomicWaker,
    policy: M,
}

// the outcome is only written by the claiming resumer and only read by the
// waiting side after observing STORED
unsafe impl<T: Send, E: Send, M: Send> Send for Shared<T, E, M> {}
unsafe impl<T: Send, E: Send, M: Sync> Sync for Shared<T, E, M> {}

impl<T, E, M: MisusePolicy> Shared<T, E, M> {
    pub fn new(policy: M) -> Self {
        Self {
            state: AtomicU8::new(PENDING),
            handles: AtomicUsize::new(0),
            data: UnsafeCell::new(None),
            waker: AtomicWaker::new(),
            policy,
        }
    }

    #[inline]
    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> &M {
        &self.policy
    }

    /// Check if a resumer has claimed the token.
    pub fn is_settled(&self) -> bool {
        self.state() & CLAIMED != 0
    }

    /// Check if the outcome is available to the waiting side.
    pub fn is_stored(&self) -> bool {
        self.state() & STORED != 0
    }

    pub fn is_discarded(&self) -> bool {
        self.state() & DISCARDED != 0
    }

    /// Attempt the pending -> settled transition. Returns `true` if this
    /// call won the transition and the outcome was delivered.
    pub fn settle(&self, outcome: Outcome<T, E>) -> bool {
        let prev = self.state.fetch_or(CLAIMED, Ordering::AcqRel);
        if prev & CLAIMED != 0 {
            self.policy.report(MisuseKind::DoubleResume);
            return false;
        }
        if prev & DISCARDED != 0 {
            // nobody is left to receive the outcome
            self.policy.report(MisuseKind::ResumeAfterDiscard);
            return false;
        }
        self.store(outcome);
        true
    }

    fn store(&self, outcome: Outcome<T, E>) {
        unsafe {
            *self.data.get() = Some(outcome);
        }
        self.state.fetch_or(STORED, Ordering::Release);
        self.waker.wake();
    }

    /// Settle the token when the last resumer is dropped without being called.
    fn abandon(&self) {
        let prev = self.state.fetch_or(CLAIMED, Ordering::AcqRel);
        if prev & (CLAIMED | DISCARDED) == 0 {
            tracing::debug!(
                label = self.policy.label(),
                "completion handler dropped before resuming"
            );
            // report before the waiting side can observe the outcome, and
            // store it even if the sink panics
            let _abandoned = StoreAbandoned(self);
            self.policy.report(MisuseKind::Leaked);
        }
    }

    pub fn acquire_handle(&self) {
        self.handles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn release_handle(&self) {
        if self.handles.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.abandon();
        }
    }

    /// Mark the waiting side as gone. Any outcome stored later is dropped
    /// along with the token.
    pub fn discard(&self) {
        self.state.fetch_or(DISCARDED, Ordering::AcqRel);
    }

    /// Take the outcome without registering a waker.
    ///
    /// Only the (single) waiting side may call this.
    pub fn try_take(&self) -> Poll<Outcome<T, E>> {
        if self.is_stored() {
            // STORED was observed with acquire ordering, the write is complete
            if let Some(outcome) = unsafe { (*self.data.get()).take() } {
                return Poll::Ready(outcome);
            }
        }
        // keeps returning Pending once the outcome was taken
        Poll::Pending
    }

    /// Only the (single) waiting side may call this.
    pub fn poll(&self, cx: &mut Context<'_>) -> Poll<Outcome<T, E>> {
        if let Poll::Ready(outcome) = self.try_take() {
            return Poll::Ready(outcome);
        }
        self.waker.register(cx.waker());
        // the outcome may have been stored before the waker was registered
        self.try_take()
    }
}

struct StoreAbandoned<'s, T, E, M: MisusePolicy>(&'s Shared<T, E, M>);

impl<T, E, M: MisusePolicy> Drop for StoreAbandoned<'_, T, E, M> {
    fn drop(&mut self) {
        self.0.store(Err(BridgeError::Abandoned));
    }
}

impl<T, E, M> Debug for Shared<T, E, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.state.load(Ordering::Acquire);
        let status = if state & STORED != 0 {
            "Settled"
        } else if state & CLAIMED != 0 {
            "Storing"
        } else {
            "Pending"
        };
        f.debug_struct("Shared")
            .field("status", &status)
            .field("discarded", &(state & DISCARDED != 0))
            .field("handles", &self.handles.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::misuse::{Checked, PanicSink, RecordingSink, Unchecked};
    use futures_task::noop_waker_ref;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::{Arc, Mutex, Weak};

    fn checked<T, E>() -> (Arc<RecordingSink>, Shared<T, E, Checked>) {
        let sink = Arc::new(RecordingSink::new());
        let shared = Shared::new(Checked::new("core").with_sink(sink.clone()));
        (sink, shared)
    }

    #[test]
    fn settle_once() {
        let shared = Shared::<u32, (), _>::new(Unchecked);
        assert!(!shared.is_settled());
        assert_eq!(shared.try_take(), Poll::Pending);
        assert!(shared.settle(Ok(1)));
        assert!(shared.is_settled());
        assert!(!shared.settle(Ok(2)));
        assert_eq!(shared.try_take(), Poll::Ready(Ok(1)));
        assert_eq!(shared.try_take(), Poll::Pending);
    }

    #[test]
    fn settle_twice_reports() {
        let (sink, shared) = checked::<u32, ()>();
        assert!(shared.settle(Err(BridgeError::Failed(()))));
        assert!(!shared.settle(Ok(5)));
        assert_eq!(sink.count(MisuseKind::DoubleResume), 1);
        assert_eq!(shared.try_take(), Poll::Ready(Err(BridgeError::Failed(()))));
    }

    #[test]
    fn settle_after_discard() {
        let (sink, shared) = checked::<u32, ()>();
        shared.discard();
        assert!(!shared.settle(Ok(5)));
        assert_eq!(sink.count(MisuseKind::ResumeAfterDiscard), 1);
        assert!(!shared.is_stored());
        assert!(!shared.settle(Ok(6)));
        assert_eq!(sink.count(MisuseKind::DoubleResume), 1);
    }

    #[test]
    fn release_last_handle_abandons() {
        let (sink, shared) = checked::<u32, ()>();
        shared.acquire_handle();
        shared.acquire_handle();
        shared.release_handle();
        assert!(!shared.is_settled());
        shared.release_handle();
        assert_eq!(shared.try_take(), Poll::Ready(Err(BridgeError::Abandoned)));
        assert_eq!(sink.count(MisuseKind::Leaked), 1);
    }

    #[test]
    fn leak_reported_before_store() {
        let target: Arc<Mutex<Option<Weak<Shared<u32, (), Checked>>>>> = Default::default();
        let seen = Arc::new(Mutex::new(None));
        let (target_c, seen_c) = (target.clone(), seen.clone());
        let sink = move |_: &str, kind: MisuseKind| {
            let shared = target_c.lock().unwrap().as_ref().and_then(Weak::upgrade);
            if let Some(shared) = shared {
                seen_c.lock().unwrap().replace((kind, shared.is_stored()));
            }
        };
        let shared = Arc::new(Shared::new(Checked::new("order").with_sink(Arc::new(sink))));
        target.lock().unwrap().replace(Arc::downgrade(&shared));
        shared.acquire_handle();
        shared.release_handle();
        assert_eq!(*seen.lock().unwrap(), Some((MisuseKind::Leaked, false)));
        assert_eq!(shared.try_take(), Poll::Ready(Err(BridgeError::Abandoned)));
    }

    #[test]
    fn leak_stored_when_sink_panics() {
        let shared =
            Shared::<u32, (), _>::new(Checked::new("strict").with_sink(Arc::new(PanicSink)));
        shared.acquire_handle();
        let released = panic::catch_unwind(AssertUnwindSafe(|| shared.release_handle()));
        assert!(released.is_err());
        assert_eq!(shared.try_take(), Poll::Ready(Err(BridgeError::Abandoned)));
    }

    #[test]
    fn release_after_discard_is_silent() {
        let (sink, shared) = checked::<u32, ()>();
        shared.acquire_handle();
        shared.discard();
        shared.release_handle();
        assert!(sink.is_empty());
    }

    #[test]
    fn poll_registers_waker() {
        let shared = Shared::<u32, (), _>::new(Unchecked);
        let mut cx = Context::from_waker(noop_waker_ref());
        assert_eq!(shared.poll(&mut cx), Poll::Pending);
        shared.settle(Ok(3));
        assert_eq!(shared.poll(&mut cx), Poll::Ready(Ok(3)));
    }
}
