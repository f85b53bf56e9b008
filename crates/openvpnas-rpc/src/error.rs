use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("http transport error: {0}")]
    Http(#[from] hyper::Error),
    #[error("invalid xml-rpc response: {0}")]
    InvalidResponse(String),
    #[error("xml-rpc fault {code}: {message}")]
    Fault { code: i64, message: String },
}

pub type Result<T> = std::result::Result<T, RpcError>;
