use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuiesceError {
    /// The last handle to a [`crate::QuiescingHelper`] was dropped while it
    /// was still `Running` -- `initiate_shutdown` was never called, so the
    /// internally-held shutdown future (obtainable via `shutdown_future`
    /// from the moment the helper is constructed, independent of any
    /// particular `initiate_shutdown` call) would otherwise hang forever.
    #[error("quiescing helper dropped without ever initiating shutdown")]
    UnusedQuiescingHelper,

    /// Surfaced when the listener channel itself fails to close; every
    /// promise waiting on this shutdown (the internal one plus any passed to
    /// `initiate_shutdown`) fails with this rather than silently treating
    /// the listener as closed.
    #[error("listener channel failed to close: {0}")]
    ListenerCloseFailed(String),
}
