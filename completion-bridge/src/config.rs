use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::panic::Location;
use std::sync::Arc;

use super::bridge::Bridge;
use super::misuse::{Checked, DiagnosticSink, TracingSink};
use super::resumer::Resumer;

/// Configuration for checked bridges.
///
/// ```
/// use std::sync::Arc;
/// use completion_bridge::{BridgeConfig, RecordingSink, Resumer};
///
/// let sink = Arc::new(RecordingSink::new());
/// let bridge = BridgeConfig::new()
///     .label("load_settings")
///     .shared_sink(sink.clone())
///     .bridge(|resumer: Resumer<u32, std::io::Error, _>| {
///         resumer.resume_returning(5);
///         resumer.resume_returning(6);
///     });
/// assert_eq!(bridge.wait().unwrap(), 5);
/// assert_eq!(sink.events().len(), 1);
/// ```
pub struct BridgeConfig {
    label: Option<Cow<'static, str>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self {
            label: None,
            sink: None,
        }
    }

    /// Set the label attached to misuse reports. It defaults to the source
    /// location of the call to [`checked`](Self::checked) or
    /// [`bridge`](Self::bridge).
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label.replace(label.into());
        self
    }

    /// Set the destination for misuse reports. It defaults to [`TracingSink`].
    pub fn sink<S>(mut self, sink: S) -> Self
    where
        S: DiagnosticSink + 'static,
    {
        self.sink.replace(Arc::new(sink));
        self
    }

    /// Set a shared destination for misuse reports.
    pub fn shared_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink.replace(sink);
        self
    }

    /// Build the checked misuse policy.
    #[track_caller]
    pub fn checked(self) -> Checked {
        let label = match self.label {
            Some(label) => label,
            None => Cow::Owned(Location::caller().to_string()),
        };
        Checked::new(label).with_sink(self.sink.unwrap_or_else(|| Arc::new(TracingSink)))
    }

    /// Create a checked bridge. See [`Bridge::with_policy`].
    #[track_caller]
    pub fn bridge<T, E, F>(self, setup: F) -> Bridge<T, E, Checked>
    where
        F: FnOnce(Resumer<T, E, Checked>),
    {
        Bridge::with_policy(self.checked(), setup)
    }

    /// Create a checked bridge with a fallible setup function. See
    /// [`Bridge::try_with_policy`].
    #[track_caller]
    pub fn try_bridge<T, E, F, S>(self, setup: F) -> Result<Bridge<T, E, Checked>, S>
    where
        F: FnOnce(Resumer<T, E, Checked>) -> Result<(), S>,
    {
        Bridge::try_with_policy(self.checked(), setup)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for BridgeConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("label", &self.label)
            .field("sink", &self.sink.as_ref().map(|_| "DiagnosticSink"))
            .finish()
    }
}
