//! Detection and reporting of completion handler misuse.
//!
//! A [`Resumer`](crate::Resumer) is meant to be called exactly once. The
//! bridge always guards the transition with a single atomic operation, so
//! misuse can never corrupt the delivered result. What differs between the
//! two policies is whether the misuse is observed:
//!
//! - [`Unchecked`] is zero-sized and ignores misuse entirely. It is intended
//!   for completion handlers whose calling discipline is already guaranteed.
//!   Beyond memory safety, the outcome of misuse is unspecified.
//! - [`Checked`] forwards every misuse event to a [`DiagnosticSink`], tagged
//!   with a label identifying the call site.

use std::borrow::Cow;
use std::fmt::{self, Debug, Display, Formatter};
use std::panic::Location;
use std::sync::{Arc, Mutex};
use std::thread;

/// The kinds of completion handler misuse detected in checked mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MisuseKind {
    /// The resumer was called after the bridge was already settled.
    DoubleResume,
    /// The resumer was called after the waiting side was dropped, or after
    /// the setup function failed.
    ResumeAfterDiscard,
    /// Every resumer was dropped without being called.
    Leaked,
}

impl MisuseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoubleResume => "double_resume",
            Self::ResumeAfterDiscard => "resume_after_discard",
            Self::Leaked => "leaked",
        }
    }
}

impl Display for MisuseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleResume => write!(f, "completion handler called more than once"),
            Self::ResumeAfterDiscard => {
                write!(f, "completion handler called after the bridge was discarded")
            }
            Self::Leaked => write!(f, "completion handler dropped without being called"),
        }
    }
}

/// A destination for misuse reports.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, label: &str, kind: MisuseKind);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str, MisuseKind) + Send + Sync,
{
    fn report(&self, label: &str, kind: MisuseKind) {
        (self)(label, kind)
    }
}

/// The default sink, which emits a `WARN` level `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, label: &str, kind: MisuseKind) {
        tracing::warn!(label = label, kind = kind.as_str(), "{}", kind);
    }
}

/// A sink which turns misuse into a panic on the thread calling the resumer.
///
/// When that thread is already panicking, the report is logged instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicSink;

impl DiagnosticSink for PanicSink {
    fn report(&self, label: &str, kind: MisuseKind) {
        if thread::panicking() {
            tracing::error!(label = label, kind = kind.as_str(), "{}", kind);
        } else {
            panic!("{}: {}", label, kind);
        }
    }
}

/// A single report collected by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisuseEvent {
    pub label: String,
    pub kind: MisuseKind,
}

/// A sink which keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MisuseEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the reports collected so far.
    pub fn events(&self) -> Vec<MisuseEvent> {
        self.lock().clone()
    }

    /// Count the collected reports of a given kind.
    pub fn count(&self, kind: MisuseKind) -> usize {
        self.lock().iter().filter(|evt| evt.kind == kind).count()
    }

    /// Check if no reports have been collected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return the collected reports.
    pub fn take(&self) -> Vec<MisuseEvent> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MisuseEvent>> {
        // a panicking sink user cannot leave the list half-written
        self.events.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, label: &str, kind: MisuseKind) {
        self.lock().push(MisuseEvent {
            label: label.to_owned(),
            kind,
        });
    }
}

/// Selects how a bridge reacts to misuse of its resumer. The policy is a type
/// parameter of the bridge, so the choice is made at construction time.
pub trait MisusePolicy: Send + Sync + 'static {
    /// Handle a misuse event.
    fn report(&self, kind: MisuseKind);

    /// The label identifying the call site, when one is tracked.
    fn label(&self) -> Option<&str> {
        None
    }
}

/// Ignore misuse. See the [module documentation](self).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Unchecked;

impl MisusePolicy for Unchecked {
    #[inline(always)]
    fn report(&self, _kind: MisuseKind) {}
}

/// Report misuse to a [`DiagnosticSink`] under a call-site label.
#[derive(Clone)]
pub struct Checked {
    label: Cow<'static, str>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Checked {
    /// Create a checked policy reporting to a [`TracingSink`].
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Create a checked policy labelled with the source location of the caller.
    #[track_caller]
    pub fn here() -> Self {
        Self::new(Location::caller().to_string())
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Debug for Checked {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checked")
            .field("label", &self.label)
            .finish()
    }
}

impl MisusePolicy for Checked {
    fn report(&self, kind: MisuseKind) {
        self.sink.report(&self.label, kind)
    }

    fn label(&self) -> Option<&str> {
        Some(&self.label)
    }
}
