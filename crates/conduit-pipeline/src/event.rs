/// Events a handler can fire or observe that aren't raw bytes.
///
/// `ChannelShouldQuiesce` is broadcast by the quiescing helper
/// (`conduit-quiesce`) to every tracked child; `Custom` carries an
/// application-defined tag for anything else a handler wants to thread
/// through the pipeline without inventing a new event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    ChannelShouldQuiesce,
    Custom(&'static str),
}

/// Tags an observed event by kind, for the debug recorders in
/// `conduit-debug`. Mirrors the inbound/outbound event taxonomy: every
/// handler in this workspace either consumes one of these or forwards it
/// unchanged.
#[derive(Debug, Clone)]
pub enum EventKind<'a> {
    Registered,
    Active,
    Inactive,
    Read(&'a [u8]),
    ReadComplete,
    WritabilityChanged(bool),
    UserEvent(&'a UserEvent),
    ErrorCaught(&'a str),
    Register,
    Bind(std::net::SocketAddr),
    Connect(std::net::SocketAddr),
    Write(&'a [u8]),
    Flush,
    ReadRequested,
    Close,
}
