use thiserror::Error;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("length field value {0} exceeds the maximum representable payload length")]
    LengthFieldOverflow(u64),

    #[error("payload of {0} byte(s) is too long for a {1}-byte length field")]
    MessageDataTooLongForLengthField(usize, usize),

    #[error("missing required Content-Length header")]
    MissingContentLengthHeader,

    #[error("illegal Content-Length header value: {0:?}")]
    IllegalContentLengthHeaderValue(String),
}
