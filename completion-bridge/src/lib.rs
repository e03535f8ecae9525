//! This crate converts completion handler (callback) based APIs into a single
//! suspension point. A `setup` function is handed a [`Resumer`], registers it
//! with the callback API and returns. The resulting [`Bridge`] resolves to the
//! payload of the first call to the resumer, either with `.await` or by
//! parking the current thread.
//!
//! ```
//! use std::thread;
//! use std::time::Duration;
//! use completion_bridge::{bridge, Bridge};
//!
//! // a callback API which completes on another thread
//! fn lookup(key: u32, on_complete: impl FnOnce(Result<String, String>) + Send + 'static) {
//!     thread::spawn(move || {
//!         thread::sleep(Duration::from_millis(5));
//!         on_complete(Ok(format!("value-{}", key)))
//!     });
//! }
//!
//! let found: Bridge<String, String> = bridge(|resumer| {
//!     lookup(7, move |result| {
//!         resumer.resume(result);
//!     })
//! });
//! assert_eq!(found.wait(), Ok("value-7".to_string()));
//! ```
//!
//! The resumer is guarded by a single atomic transition, so only the first
//! call is ever delivered, whichever thread it comes from. Bridges created
//! with [`checked_bridge`] or [`BridgeConfig`] also report misuse of the
//! resumer (calling it twice, calling it after the waiting side went away,
//! or dropping it without calling it) to a [`DiagnosticSink`].
//!
//! Completion handlers come in a few shapes: a `Result`, a bare value, an
//! optional value paired with an optional error, or several positional
//! values. See the [`shape`] module.
//!
//! This crate uses `unsafe` code blocks.

mod bridge;
pub use self::bridge::{Bridge, MapOk};

mod config;
pub use self::config::BridgeConfig;

mod core;

mod error;
pub use self::error::BridgeError;

pub mod misuse;
pub use self::misuse::{
    Checked, DiagnosticSink, MisuseEvent, MisuseKind, MisusePolicy, PanicSink, RecordingSink,
    TracingSink, Unchecked,
};

mod resumer;
pub use self::resumer::Resumer;

pub mod shape;
pub use self::shape::Response;

mod thread;

/// Create an unchecked bridge. The `setup` function is called once, before
/// returning, and must arrange for the resumer to be called exactly once.
/// Misuse of the resumer is not reported.
pub fn bridge<T, E, F>(setup: F) -> Bridge<T, E>
where
    F: FnOnce(Resumer<T, E>),
{
    Bridge::with_policy(Unchecked, setup)
}

/// Create an unchecked bridge with a fallible `setup` function. If `setup`
/// fails, the error is returned without suspending.
pub fn try_bridge<T, E, F, S>(setup: F) -> Result<Bridge<T, E>, S>
where
    F: FnOnce(Resumer<T, E>) -> Result<(), S>,
{
    Bridge::try_with_policy(Unchecked, setup)
}

/// Create a checked bridge, labelled with the source location of the caller
/// and reporting misuse to a [`TracingSink`].
#[track_caller]
pub fn checked_bridge<T, E, F>(setup: F) -> Bridge<T, E, Checked>
where
    F: FnOnce(Resumer<T, E, Checked>),
{
    Bridge::with_policy(Checked::here(), setup)
}

/// Create a checked bridge with a fallible `setup` function.
#[track_caller]
pub fn try_checked_bridge<T, E, F, S>(setup: F) -> Result<Bridge<T, E, Checked>, S>
where
    F: FnOnce(Resumer<T, E, Checked>) -> Result<(), S>,
{
    Bridge::try_with_policy(Checked::here(), setup)
}
