//! Debug event recorders (spec component I): two purely observational
//! handlers that tag every inbound/outbound event by kind and forward it
//! to a caller-supplied sink, then pass the event downstream unchanged.

use conduit_pipeline::EventKind;

/// Receives a tagged event. The default sink (`TracingSink`) logs at
/// `debug!`, matching this workspace's default instrumentation style; a
/// caller that wants to capture events (tests, an in-process inspector)
/// supplies its own closure instead.
pub trait DebugSink {
    fn observe(&mut self, kind: &EventKind<'_>);
}

impl<F: FnMut(&EventKind<'_>)> DebugSink for F {
    fn observe(&mut self, kind: &EventKind<'_>) {
        self(kind)
    }
}

pub struct TracingSink;

impl DebugSink for TracingSink {
    fn observe(&mut self, kind: &EventKind<'_>) {
        tracing::debug!(?kind, "pipeline event");
    }
}

/// Forwards every inbound event (`registered`, `active`, `inactive`,
/// `read`, `readComplete`, `userEvent`, `errorCaught`) to its sink,
/// unchanged, in arrival order.
pub struct InboundDebugRecorder<S: DebugSink = TracingSink> {
    sink: S,
}

impl InboundDebugRecorder<TracingSink> {
    pub fn new() -> Self {
        Self { sink: TracingSink }
    }
}

impl Default for InboundDebugRecorder<TracingSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DebugSink> InboundDebugRecorder<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    /// Tags `kind` to the sink and hands the identical event back for the
    /// caller to forward downstream.
    pub fn observe<'a>(&mut self, kind: EventKind<'a>) -> EventKind<'a> {
        self.sink.observe(&kind);
        kind
    }
}

/// Forwards every outbound event (`bind`, `connect`, `write`, `flush`,
/// `readRequested`, `close`) to its sink, unchanged, in submission order.
pub struct OutboundDebugRecorder<S: DebugSink = TracingSink> {
    sink: S,
}

impl OutboundDebugRecorder<TracingSink> {
    pub fn new() -> Self {
        Self { sink: TracingSink }
    }
}

impl Default for OutboundDebugRecorder<TracingSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DebugSink> OutboundDebugRecorder<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    pub fn observe<'a>(&mut self, kind: EventKind<'a>) -> EventKind<'a> {
        self.sink.observe(&kind);
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_recorder_forwards_the_event_unchanged() {
        let mut seen = Vec::new();
        let mut recorder = InboundDebugRecorder::with_sink(|kind: &EventKind<'_>| {
            seen.push(format!("{kind:?}"));
        });
        let forwarded = recorder.observe(EventKind::Read(b"payload"));
        assert!(matches!(forwarded, EventKind::Read(data) if data == b"payload"));
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("Read"));
    }

    #[test]
    fn outbound_recorder_forwards_the_event_unchanged() {
        let mut count = 0;
        let mut recorder = OutboundDebugRecorder::with_sink(|_: &EventKind<'_>| count += 1);
        recorder.observe(EventKind::Flush);
        recorder.observe(EventKind::Close);
        assert_eq!(count, 2);
    }

    #[test]
    fn events_are_observed_in_submission_order() {
        let mut order = Vec::new();
        let mut recorder = InboundDebugRecorder::with_sink(|kind: &EventKind<'_>| {
            order.push(match kind {
                EventKind::Registered => "registered",
                EventKind::Active => "active",
                EventKind::ReadComplete => "read_complete",
                _ => "other",
            });
        });
        recorder.observe(EventKind::Registered);
        recorder.observe(EventKind::Active);
        recorder.observe(EventKind::ReadComplete);
        assert_eq!(order, vec!["registered", "active", "read_complete"]);
    }
}
