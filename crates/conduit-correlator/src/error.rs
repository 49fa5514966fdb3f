use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrelatorError {
    #[error("the correlator is already in a failed state")]
    CorrelatorFailed,

    #[error("response received but no request is outstanding")]
    ResponseBufferEmpty,

    #[error("response for unknown request id {0}")]
    ResponseForInvalidRequest(String),

    #[error("channel closed before a response was received")]
    ClosedBeforeReceivingResponse,

    #[error("upstream error: {0}")]
    Upstream(String),
}
