use conduit_pipeline::{Channel, PipelineError, Promise, PromiseFuture};

use crate::deadline::Deadline;
use crate::error::ProxyError;
use crate::scanner::scan_response_head;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    AwaitingResponse,
    Established,
    Failed,
}

/// Result of handing a read to the handshake handler.
pub enum ReadOutcome {
    /// The handshake isn't complete yet; the caller should keep feeding it
    /// bytes as they arrive.
    Pending,
    /// The tunnel is established; bytes at this offset and beyond in the
    /// fed data are ordinary tunneled payload and should be forwarded
    /// downstream unchanged. The caller should remove this handler from
    /// its pipeline now.
    Established { payload_start: usize },
}

/// Drives the CONNECT handshake state machine (spec component H):
/// `initial -> awaiting_response -> established | failed`. This handler
/// does not own an event loop or timer; deadline expiry is checked by the
/// caller polling `check_deadline` (e.g. on every timer tick), matching
/// this crate's "deadline is an external collaborator" design (see
/// `Deadline`).
pub struct ConnectHandshake<D: Deadline> {
    target_host: String,
    target_port: u16,
    headers: Vec<(String, String)>,
    deadline: D,
    state: State,
    established_promise: Promise<()>,
    buffer: Vec<u8>,
}

impl<D: Deadline> ConnectHandshake<D> {
    pub fn new(target_host: impl Into<String>, target_port: u16, headers: Vec<(String, String)>, deadline: D) -> Self {
        Self {
            target_host: target_host.into(),
            target_port,
            headers,
            deadline,
            state: State::Initial,
            established_promise: Promise::new(),
            buffer: Vec::new(),
        }
    }

    pub fn established_future(&self) -> PromiseFuture<()> {
        self.established_promise.future()
    }

    fn request_head(&self) -> Vec<u8> {
        let authority = format!("{}:{}", self.target_host, self.target_port);
        let mut out = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n").into_bytes();
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out
    }

    /// Called once the handler is added and the channel is active: emits
    /// the `CONNECT` request head (with an empty body terminator implicit
    /// in the blank line) and transitions to `awaiting_response`.
    pub fn on_active<C: Channel>(&mut self, channel: &mut C) {
        if self.state != State::Initial {
            return;
        }
        channel.write(self.request_head());
        channel.flush();
        self.state = State::AwaitingResponse;
    }

    /// Checked by the caller on a timer tick (or before forwarding another
    /// read) to notice the deadline has elapsed.
    pub fn check_deadline<C: Channel>(&mut self, channel: &mut C) -> Option<ProxyError> {
        if self.state == State::AwaitingResponse && self.deadline.has_elapsed() {
            self.state = State::Failed;
            channel.close();
            self.established_promise.fail(PipelineError::from("proxy handshake timed out"));
            return Some(ProxyError::ProxyHandshakeTimeout);
        }
        None
    }

    /// Feeds inbound bytes to the handshake scanner.
    pub fn on_read<C: Channel>(&mut self, channel: &mut C, data: &[u8]) -> Result<ReadOutcome, ProxyError> {
        if self.state != State::AwaitingResponse {
            return Ok(ReadOutcome::Pending);
        }
        self.buffer.extend_from_slice(data);

        let Some(head) = scan_response_head(&self.buffer) else {
            return Ok(ReadOutcome::Pending);
        };

        let trailing = self.buffer.len() - head.header_block_end;
        let result = match head.status {
            200..=299 if trailing == 0 => {
                self.state = State::Established;
                self.established_promise.succeed(());
                Ok(ReadOutcome::Established { payload_start: head.header_block_end })
            }
            200..=299 => {
                self.state = State::Failed;
                Err(ProxyError::InvalidProxyResponse("body arrived before the response ended".to_string()))
            }
            407 => {
                self.state = State::Failed;
                Err(ProxyError::ProxyAuthenticationRequired)
            }
            other => {
                self.state = State::Failed;
                Err(ProxyError::InvalidProxyResponse(format!("unexpected status {other}")))
            }
        };

        if let Err(ref err) = result {
            channel.close();
            self.established_promise.fail(PipelineError::from(err.to_string()));
        }
        result
    }
}
