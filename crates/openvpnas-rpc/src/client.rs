//! Session-scoped XML-RPC client over a Unix domain socket.
//!
//! The agent only listens on a filesystem socket, so the usual
//! resolve-and-dial step is replaced with a `UnixStream` connect; request
//! framing stays plain HTTP/1.1 with a placeholder `localhost` authority.

use std::path::Path;

use bytes::Bytes;
use http::{Request, header};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tracing::debug;

use crate::codec;
use crate::error::{Result, RpcError};
use crate::value::Value;

/// One live connection to the agent. Dropping the session closes it.
pub struct RpcSession {
    sender: http1::SendRequest<Full<Bytes>>,
}

impl RpcSession {
    /// Opens the socket and performs the HTTP/1.1 handshake.
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (sender, connection) = http1::handshake::<_, Full<Bytes>>(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                debug!(error = %err, "xml-rpc connection terminated");
            }
        });
        Ok(Self { sender })
    }

    /// Invokes a parameterless remote procedure and decodes its response.
    pub async fn call(&mut self, method: &str) -> Result<Value> {
        let body = codec::encode_call(method);
        let request = Request::post("/")
            .header(header::HOST, "localhost")
            .header(header::CONTENT_TYPE, "text/xml")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Full::new(Bytes::from(body)))
            .map_err(|err| RpcError::InvalidResponse(format!("failed to build request: {err}")))?;

        let response = self.sender.send_request(request).await?;
        let status = response.status();
        let payload = response.into_body().collect().await?.to_bytes();
        if !status.is_success() {
            return Err(RpcError::InvalidResponse(format!(
                "agent returned http status {status}"
            )));
        }

        let text = std::str::from_utf8(&payload)
            .map_err(|err| RpcError::InvalidResponse(format!("response is not utf-8: {err}")))?;
        codec::decode_response(text)
    }
}
