use std::net::SocketAddr;

use crate::error::PipelineError;
use crate::promise::Promise;

/// Static facts about a channel that don't change once it's wired up.
#[derive(Debug, Clone, Default)]
pub struct ChannelInfo {
    pub local_address: Option<SocketAddr>,
    pub remote_address: Option<SocketAddr>,
}

/// The narrow slice of the event-loop/socket collaborator a middleware
/// handler is allowed to touch: write bytes, flush, close, and read back
/// whether it's still active. Everything else (accepting connections,
/// actually performing I/O, TLS) lives outside this workspace.
pub trait Channel {
    fn info(&self) -> &ChannelInfo;

    fn is_active(&self) -> bool;

    /// Queues `data` for the wire. Resolves once the write has been
    /// accepted by the transport (not necessarily flushed -- see
    /// `conduit-pcap`'s `emitPCAPWrites` setting for the distinction
    /// downstream code may care about).
    fn write(&mut self, data: Vec<u8>) -> Promise<()>;

    fn flush(&mut self);

    /// Closes the channel. Resolves once teardown completes; any I/O error
    /// encountered while closing is surfaced through the promise rather
    /// than silently dropped.
    fn close(&mut self) -> Promise<()>;
}

/// In-memory stand-in for a real channel, used by every `conduit-*` crate's
/// unit tests. Records every write so a test can assert on exactly what a
/// handler put on the wire.
pub struct TestChannel {
    info: ChannelInfo,
    active: bool,
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
    pub closed: bool,
}

impl TestChannel {
    pub fn new(local: SocketAddr, remote: SocketAddr) -> Self {
        Self {
            info: ChannelInfo { local_address: Some(local), remote_address: Some(remote) },
            active: true,
            writes: Vec::new(),
            flushes: 0,
            closed: false,
        }
    }

    pub fn take_writes(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.writes)
    }
}

impl Channel for TestChannel {
    fn info(&self) -> &ChannelInfo {
        &self.info
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn write(&mut self, data: Vec<u8>) -> Promise<()> {
        if !self.active {
            return Promise::completed(Err(PipelineError::from("channel is not active")));
        }
        self.writes.push(data);
        Promise::completed(Ok(()))
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn close(&mut self) -> Promise<()> {
        self.active = false;
        self.closed = true;
        Promise::completed(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_channel_records_writes_until_closed() {
        let mut channel = TestChannel::new(addr(1), addr(2));
        channel.write(b"hello".to_vec());
        channel.write(b"world".to_vec());
        assert_eq!(channel.take_writes(), vec![b"hello".to_vec(), b"world".to_vec()]);
        channel.close();
        assert!(!channel.is_active());
        let promise = channel.write(b"late".to_vec());
        let future = promise.future();
        let mut failed = false;
        future.on_complete(move |r| failed = r.is_err());
        assert!(failed);
    }
}
