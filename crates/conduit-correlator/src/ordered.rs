use std::collections::VecDeque;

use conduit_pipeline::{PipelineError, Promise};

use crate::{CorrelatorError, CorrelatorState, WriteOutcome};

/// Matches each inbound response to the oldest still-outstanding request,
/// in submission order.
pub struct OrderedCorrelator<Resp> {
    outstanding: VecDeque<Promise<Resp>>,
    state: CorrelatorState,
}

impl<Resp> Default for OrderedCorrelator<Resp> {
    fn default() -> Self {
        Self { outstanding: VecDeque::new(), state: CorrelatorState::Active }
    }
}

impl<Resp> OrderedCorrelator<Resp> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    /// Accepts an outbound `(request, promise)` pair. In the failed state,
    /// fails `promise` immediately and rejects the write; otherwise the
    /// promise is enqueued and `request` is handed back for the caller to
    /// forward downstream.
    pub fn write<Req>(&mut self, request: Req, promise: Promise<Resp>) -> WriteOutcome<Req> {
        if self.state == CorrelatorState::Failed {
            promise.fail(Box::new(CorrelatorError::CorrelatorFailed));
            return WriteOutcome::Rejected;
        }
        self.outstanding.push_back(promise);
        WriteOutcome::Forward(request)
    }

    /// A response arrived inbound. Matches the oldest outstanding promise.
    pub fn read_response(&mut self, response: Resp) -> Result<(), CorrelatorError> {
        match self.outstanding.pop_front() {
            Some(promise) => {
                promise.succeed(response);
                Ok(())
            }
            None => {
                self.fail_all(CorrelatorError::ResponseBufferEmpty.to_string());
                Err(CorrelatorError::ResponseBufferEmpty)
            }
        }
    }

    pub fn error_caught(&mut self, err: PipelineError) {
        self.fail_all(err.to_string());
    }

    pub fn channel_inactive(&mut self) {
        self.fail_all(CorrelatorError::ClosedBeforeReceivingResponse.to_string());
    }

    fn fail_all(&mut self, message: String) {
        self.state = CorrelatorState::Failed;
        while let Some(promise) = self.outstanding.pop_front() {
            promise.fail(Box::new(CorrelatorError::Upstream(message.clone())));
        }
    }
}
