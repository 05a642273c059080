//! Wire transcript sink.
//!
//! Every byte sent to or received from a device can be mirrored into a
//! [`TranscriptSink`] supplied at construction time. The sink is scoped to
//! one batch run — there is no global logger mutation; callers that want a
//! persisted transcript (the CLI writes one per run) inject their own
//! implementation, and everything else gets [`NullSink`].

/// Placeholder written to the transcript in place of secret material.
pub const SECRET_MASK: &str = "********";

/// Receives a copy of all traffic on a session's shell channel.
///
/// Implementations must be cheap and infallible: a sink that cannot write
/// should drop the line rather than disturb the session driving it.
pub trait TranscriptSink: Send + Sync {
    /// Text transmitted to the device, line endings included.
    fn sent(&self, text: &str);

    /// A raw chunk received from the device.
    fn received(&self, data: &[u8]);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TranscriptSink for NullSink {
    fn sent(&self, _text: &str) {}
    fn received(&self, _data: &[u8]) {}
}
