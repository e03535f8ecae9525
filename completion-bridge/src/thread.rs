use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use futures_task::{waker, ArcWake};

struct Unparker(Thread);

impl ArcWake for Unparker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark()
    }
}

thread_local! {
    static UNPARKER: Waker = waker(Arc::new(Unparker(thread::current())));
}

/// Poll until the result is ready, parking the current thread in between.
/// With a deadline, `Poll::Pending` is returned once it has passed.
///
/// The waker handed to `poll_fn` is shared by every call on this thread, so
/// a stale wakeup from an earlier bridge only costs an extra poll.
pub(crate) fn park_until<F, R>(mut poll_fn: F, expire: Option<Instant>) -> Poll<R>
where
    F: FnMut(&mut Context<'_>) -> Poll<R>,
{
    UNPARKER.with(|waker| {
        let mut cx = Context::from_waker(waker);
        loop {
            if let Poll::Ready(result) = poll_fn(&mut cx) {
                break Poll::Ready(result);
            }
            match expire {
                None => thread::park(),
                Some(expire) => match expire.checked_duration_since(Instant::now()) {
                    Some(remain) if remain > Duration::from_nanos(0) => {
                        thread::park_timeout(remain)
                    }
                    _ => break Poll::Pending,
                },
            }
        }
    })
}
