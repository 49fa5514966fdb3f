//! HTTP CONNECT proxy handshake handler (spec component H): issues the
//! `CONNECT` request on channel-active, scans the response head with a
//! hand-rolled scanner, and resolves `established_future` once the tunnel
//! is up -- or fails it with the matching error and closes the channel.

mod deadline;
mod error;
mod handshake;
mod scanner;

pub use deadline::{Deadline, InstantDeadline};
pub use error::ProxyError;
pub use handshake::{ConnectHandshake, ReadOutcome};
