pub mod client;
pub mod codec;
pub mod error;
pub mod value;

pub use client::RpcSession;
pub use error::{Result, RpcError};
pub use value::Value;
