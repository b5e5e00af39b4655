//! Connection factory for proxy calls.
//!
//! Every proxy call opens a fresh connection, performs one
//! request/response exchange, and drops the socket. There is no
//! persistent session; proxies stay valid across server restarts.

use std::net::TcpStream;

use treefs_core::Error;
use treefs_wire::{recv_frame, send_frame, Request};

/// Opens one connection per call to a fixed server address.
#[derive(Debug, Clone)]
pub struct Connector {
    addr: String,
}

impl Connector {
    pub fn new(addr: impl Into<String>) -> Self {
        Connector { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn connect(&self) -> Result<TcpStream, Error> {
        TcpStream::connect(&self.addr)
            .map_err(|e| Error::transport(format!("{}: {}", self.addr, e)))
    }

    /// One request/response round trip on a fresh connection.
    ///
    /// Returns the response payload for value-returning commands, `None`
    /// for void commands (which get no response frame).
    pub fn call(&self, request: &Request) -> Result<Option<Vec<u8>>, Error> {
        let mut stream = self.connect()?;
        log::debug!("-> {}: {}", self.addr, request.command);
        send_frame(&mut stream, &request.encode());

        if request.command.returns_value() {
            Ok(Some(recv_frame(&mut stream)?))
        } else {
            Ok(None)
        }
    }

    /// Round trip for a value-returning command, deserializing the
    /// response payload.
    pub fn call_value<T: serde::de::DeserializeOwned>(
        &self,
        request: &Request,
    ) -> Result<T, Error> {
        let payload = self.call(request)?.ok_or_else(|| {
            Error::transport(format!("{}: no response payload", request.command))
        })?;
        serde_json::from_slice(&payload)
            .map_err(|e| Error::transport(format!("{}: bad response: {}", request.command, e)))
    }
}
