//! Request/response service layer over a `CapabilityIndex`.
//!
//! Requests are newline-delimited JSON objects tagged by `service`; each one
//! gets exactly one JSON response line. A malformed line produces an error
//! response and the stream keeps being served. The same handler backs stdio
//! and TCP, and every connection shares the one index it was given.

use crate::catalog::{CapabilityIndex, Interface, Provider, SemanticInterface};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum Request {
    ReloadCapabilities,
    GetInterfaces,
    GetProviders { interface: String },
    GetSemanticInterfaces { interface: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { result: ResponseBody },
    Error { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Interfaces {
        interfaces: Vec<Interface>,
    },
    Providers {
        providers: Vec<Provider>,
    },
    SemanticInterfaces {
        semantic_interfaces: Vec<SemanticInterface>,
    },
    /// Acknowledgment with no payload; must stay last so it only matches `{}`.
    Empty {},
}

/// Exposes an index over the request/response protocol.
#[derive(Clone, Copy, Debug)]
pub struct CapabilityServer<'a> {
    index: &'a CapabilityIndex,
}

impl<'a> CapabilityServer<'a> {
    pub fn new(index: &'a CapabilityIndex) -> Self {
        Self { index }
    }

    pub fn handle(&self, request: Request) -> Response {
        let result = match request {
            Request::ReloadCapabilities => {
                info!("Reloading capabilities");
                self.index.reload(None);
                ResponseBody::Empty {}
            }
            Request::GetInterfaces => ResponseBody::Interfaces {
                interfaces: self.index.interfaces(),
            },
            Request::GetProviders { interface } => ResponseBody::Providers {
                providers: self.index.providers(&interface),
            },
            Request::GetSemanticInterfaces { interface } => ResponseBody::SemanticInterfaces {
                semantic_interfaces: self.index.semantic_interfaces(&interface),
            },
        };
        Response::Ok { result }
    }

    /// Parse and answer a single request line.
    pub fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                debug!(?request, "handling request");
                self.handle(request)
            }
            Err(err) => {
                warn!("rejecting request: {err}");
                Response::Error {
                    message: format!("invalid request: {err}"),
                }
            }
        }
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    ///
    /// Only I/O failures end the loop; undecodable lines get an error response.
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .context("reading request")?;
            if read == 0 {
                break;
            }
            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim()),
                Err(err) => {
                    warn!("rejecting request: {err}");
                    Response::Error {
                        message: format!("invalid request: {err}"),
                    }
                }
            };
            serde_json::to_writer(&mut writer, &response).context("encoding response")?;
            writer.write_all(b"\n").context("writing response")?;
            writer.flush().context("flushing response")?;
        }
        Ok(())
    }

    /// Accept TCP connections forever, one thread per connection.
    pub fn serve_tcp(&self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr().context("resolving listener address")?;
        info!("capability server listening on {local}");
        thread::scope(|scope| {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let server = *self;
                        scope.spawn(move || server.serve_connection(stream));
                    }
                    Err(err) => warn!("accepting connection: {err}"),
                }
            }
        });
        Ok(())
    }

    fn serve_connection(&self, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());
        debug!("connection from {peer}");
        let reader = match stream.try_clone() {
            Ok(read_half) => BufReader::new(read_half),
            Err(err) => {
                warn!("cloning stream for {peer}: {err}");
                return;
            }
        };
        if let Err(err) = self.serve(reader, BufWriter::new(stream)) {
            warn!("connection {peer} closed: {err:#}");
        }
    }
}
