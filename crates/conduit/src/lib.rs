//! Facade crate: re-exports every `conduit-*` middleware crate as a
//! module, for downstream consumers that want one dependency instead of
//! ten.

pub use conduit_bytes as bytes;
pub use conduit_codec as codec;
pub use conduit_compression as compression;
pub use conduit_correlator as correlator;
pub use conduit_debug as debug;
pub use conduit_framing as framing;
pub use conduit_pcap as pcap;
pub use conduit_pipeline as pipeline;
pub use conduit_proxy as proxy;
pub use conduit_quiesce as quiesce;
