#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
pub struct TestDrop<T>(pub T, Arc<AtomicUsize>);

impl<T> TestDrop<T> {
    pub fn new(value: T) -> (Self, DropCount) {
        let count = Arc::new(AtomicUsize::new(0));
        (Self(value, count.clone()), DropCount(count))
    }
}

impl<T> Drop for TestDrop<T> {
    fn drop(&mut self) {
        self.1.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
pub struct DropCount(Arc<AtomicUsize>);

impl DropCount {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// A stand-in for a callback based API which completes on its own thread.
pub fn complete_later<F>(delay: Duration, on_complete: F)
where
    F: FnOnce() + Send + 'static,
{
    thread::spawn(move || {
        thread::sleep(delay);
        on_complete();
    });
}
