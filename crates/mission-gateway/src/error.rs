use thiserror::Error;

/// Errors produced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error("http error: {0}")]
    Http(#[from] http::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] hyper::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
