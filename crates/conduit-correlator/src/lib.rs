//! Request/response correlator (spec component D): attaches outbound
//! requests to inbound responses, either by arrival order (`OrderedCorrelator`)
//! or by an application-supplied identifier (`KeyedCorrelator`).

mod error;
mod keyed;
mod ordered;

pub use error::CorrelatorError;
pub use keyed::KeyedCorrelator;
pub use ordered::OrderedCorrelator;

/// Whether the correlator is still accepting requests or has permanently
/// failed (an error or a closed channel fails every outstanding promise and
/// forecloses on any future ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CorrelatorState {
    Active,
    Failed,
}

/// What to do with the request half of a `write` call.
#[derive(Debug)]
pub enum WriteOutcome<Req> {
    /// The correlator accepted the request; forward it downstream.
    Forward(Req),
    /// The correlator is already in a failed state; the request was never
    /// forwarded and `promise` has already been failed.
    Rejected,
}
