use std::collections::HashMap;
use std::hash::Hash;

use conduit_pipeline::{PipelineError, Promise};

use crate::{CorrelatorError, CorrelatorState, WriteOutcome};

/// Matches each inbound response to the outstanding request sharing its
/// identifier, rather than arrival order. `Id` is whatever the wire protocol
/// uses to correlate a response to its request (a JSON-RPC numeric id, a
/// UUID, ...).
pub struct KeyedCorrelator<Id, Resp> {
    outstanding: HashMap<Id, Promise<Resp>>,
    state: CorrelatorState,
}

impl<Id, Resp> Default for KeyedCorrelator<Id, Resp> {
    fn default() -> Self {
        Self { outstanding: HashMap::new(), state: CorrelatorState::Active }
    }
}

impl<Id, Resp> KeyedCorrelator<Id, Resp>
where
    Id: Eq + Hash + Clone + std::fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    /// Accepts an outbound `(request, id, promise)` triple. In the failed
    /// state, fails `promise` immediately and rejects the write; otherwise
    /// the promise is recorded under `id` and `request` is handed back for
    /// the caller to forward downstream.
    pub fn write<Req>(&mut self, request: Req, id: Id, promise: Promise<Resp>) -> WriteOutcome<Req> {
        if self.state == CorrelatorState::Failed {
            promise.fail(Box::new(CorrelatorError::CorrelatorFailed));
            return WriteOutcome::Rejected;
        }
        self.outstanding.insert(id, promise);
        WriteOutcome::Forward(request)
    }

    /// A response carrying `id` arrived inbound. Matches the promise
    /// recorded for that id; a response for an id with no outstanding
    /// request is a protocol error that fails every other pending promise
    /// and closes the correlator.
    pub fn read_response(&mut self, id: Id, response: Resp) -> Result<(), CorrelatorError> {
        match self.outstanding.remove(&id) {
            Some(promise) => {
                promise.succeed(response);
                Ok(())
            }
            None => {
                let err = CorrelatorError::ResponseForInvalidRequest(id.to_string());
                self.fail_all(err.to_string());
                Err(err)
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
        for (_, promise) in self.outstanding.drain() {
            promise.fail(Box::new(CorrelatorError::Upstream(message.clone())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_match_by_id_regardless_of_delivery_order() {
        let mut correlator = KeyedCorrelator::<u32, &'static str>::new();
        let p1 = Promise::new();
        let f1 = p1.future();
        let p2 = Promise::new();
        let f2 = p2.future();

        assert!(matches!(correlator.write("req-1", 1, p1), WriteOutcome::Forward("req-1")));
        assert!(matches!(correlator.write("req-2", 2, p2), WriteOutcome::Forward("req-2")));

        // responses arrive out of order relative to the requests
        correlator.read_response(2, "resp-for-2").unwrap();
        correlator.read_response(1, "resp-for-1").unwrap();

        let mut seen1 = None;
        f1.on_complete(move |r| seen1 = Some(*r.as_ref().unwrap()));
        let mut seen2 = None;
        f2.on_complete(move |r| seen2 = Some(*r.as_ref().unwrap()));
        assert_eq!(seen1, Some("resp-for-1"));
        assert_eq!(seen2, Some("resp-for-2"));
    }

    #[test]
    fn every_request_completes_exactly_once_under_any_response_permutation() {
        for perm in [[1u32, 2, 3], [3, 2, 1], [2, 1, 3], [2, 3, 1]] {
            let mut correlator = KeyedCorrelator::<u32, u32>::new();
            let mut futures = Vec::new();
            for id in 1..=3u32 {
                let promise = Promise::new();
                futures.push((id, promise.future()));
                correlator.write(id, id, promise);
            }
            for id in perm {
                correlator.read_response(id, id * 10).unwrap();
            }
            for (id, future) in futures {
                let mut got = None;
                future.on_complete(move |r| got = Some(*r.as_ref().unwrap()));
                assert_eq!(got, Some(id * 10));
            }
        }
    }

    #[test]
    fn response_for_unknown_id_fails_every_outstanding_promise_and_closes_state() {
        let mut correlator = KeyedCorrelator::<u32, &'static str>::new();
        let p1 = Promise::new();
        let f1 = p1.future();
        correlator.write("req-1", 1, p1);

        let err = correlator.read_response(999, "orphan").unwrap_err();
        assert!(matches!(err, CorrelatorError::ResponseForInvalidRequest(ref id) if id == "999"));

        let mut failed = false;
        f1.on_complete(move |r| failed = r.is_err());
        assert!(failed);

        let p2 = Promise::new();
        assert!(matches!(correlator.write("late", 2, p2), WriteOutcome::Rejected));
    }

    #[test]
    fn channel_inactive_fails_every_outstanding_promise() {
        let mut correlator = KeyedCorrelator::<u32, &'static str>::new();
        let p = Promise::new();
        let f = p.future();
        correlator.write("req", 1, p);
        correlator.channel_inactive();
        let mut failed = false;
        f.on_complete(move |r| failed = r.is_err());
        assert!(failed);
    }

    #[test]
    fn error_caught_fails_outstanding_and_future_writes() {
        let mut correlator = KeyedCorrelator::<u32, &'static str>::new();
        let p1 = Promise::new();
        let f1 = p1.future();
        correlator.write("req-1", 1, p1);
        correlator.error_caught("connection reset".into());

        let mut failed = false;
        f1.on_complete(move |r| failed = r.is_err());
        assert!(failed);

        let p2 = Promise::new();
        assert!(matches!(correlator.write("req-2", 2, p2), WriteOutcome::Rejected));
    }
}
