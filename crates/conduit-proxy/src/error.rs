use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy requires authentication (407)")]
    ProxyAuthenticationRequired,

    /// Any response status other than `2xx`/`407`, or a body arriving
    /// before the response head has ended.
    #[error("invalid proxy response: {0}")]
    InvalidProxyResponse(String),

    #[error("proxy handshake did not complete before its deadline")]
    ProxyHandshakeTimeout,
}
