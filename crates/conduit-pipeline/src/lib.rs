//! Narrow collaborator abstractions shared by every `conduit-*` middleware
//! crate: the channel object, the promise/future pair, and the handful of
//! cross-cutting event types a handler can observe or fire. The event loop,
//! socket layer, HTTP parser and TLS themselves are out of scope here --
//! this crate only defines the seams real implementations of those plug
//! into, plus a small in-memory [`TestChannel`] that stands in for them in
//! tests.

mod assert;
mod channel;
mod error;
mod event;
mod promise;

pub use channel::{Channel, ChannelInfo, TestChannel};
pub use error::PipelineError;
pub use event::{EventKind, UserEvent};
pub use promise::{Promise, PromiseFuture};
