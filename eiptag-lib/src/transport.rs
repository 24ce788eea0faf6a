//! Session transport: one TCP connection, one registered CIP session,
//! single-flight request/response with timeout and one-shot reconnect.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cip::{encap, response, service};
use crate::config::RoutePath;
use crate::error::{ClientError, Result};

pub const DEFAULT_PORT: u16 = 44818;

/// Owns the socket and session handle. Callers serialize access through the
/// client's mutex, so at most one request is ever in flight.
pub struct Transport {
    host: String,
    route: RoutePath,
    io_timeout: Duration,
    state: State,
    context_counter: u64,
}

enum State {
    Closed,
    Open {
        stream: TcpStream,
        session_handle: u32,
    },
}

impl Transport {
    pub fn new(host: String, route: RoutePath, io_timeout: Duration) -> Transport {
        Transport {
            host,
            route,
            io_timeout,
            state: State::Closed,
            context_counter: 0,
        }
    }

    /// Send one Read/Write service and return the raw reply frame. A stale
    /// or oversize encapsulation status tears the session down and re-sends
    /// exactly once; the second failure surfaces.
    pub async fn transact(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        match self.transact_once(message).await {
            Err(err) if err.is_oversize() => {
                debug!(error = %err, "encapsulation rejected, re-registering session");
                self.state = State::Closed;
                self.transact_once(message).await
            }
            other => other,
        }
    }

    async fn transact_once(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open().await?;
        self.context_counter = self.context_counter.wrapping_add(1);

        let wrapped = service::unconnected_send(message, &self.route);
        let body = service::rr_data_body(&wrapped);
        let State::Open {
            stream,
            session_handle,
        } = &mut self.state
        else {
            return Err(ClientError::ConnectionClosed);
        };
        let frame = encap::frame(encap::SEND_RR_DATA, *session_handle, self.context_counter, &body);

        match exchange(stream, &frame, self.io_timeout).await {
            Ok(reply) => {
                response::check_encapsulation(&reply)?;
                Ok(reply)
            }
            Err(err) => {
                // the stream may have partial bytes in flight
                self.state = State::Closed;
                Err(err)
            }
        }
    }

    async fn ensure_open(&mut self) -> Result<()> {
        if matches!(self.state, State::Open { .. }) {
            return Ok(());
        }
        let addr = if self.host.contains(':') {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, DEFAULT_PORT)
        };
        let stream = match timeout(self.io_timeout, TcpStream::connect(&addr)).await {
            Err(_) => return Err(ClientError::Timeout),
            Ok(Err(err)) => return Err(ClientError::ConnectFailed(err)),
            Ok(Ok(stream)) => stream,
        };
        stream.set_nodelay(true)?;

        self.context_counter = self.context_counter.wrapping_add(1);
        let mut stream = stream;
        let frame = encap::register_session(self.context_counter);
        let reply = exchange(&mut stream, &frame, self.io_timeout).await?;
        response::check_encapsulation(&reply)?;
        let header = encap::Header::parse(&reply)?;
        debug!(session = header.session_handle, peer = %addr, "session registered");
        self.state = State::Open {
            stream,
            session_handle: header.session_handle,
        };
        Ok(())
    }

    /// Best-effort UnRegisterSession, then drop the socket. Idempotent.
    pub async fn close(&mut self) {
        if let State::Open {
            stream,
            session_handle,
        } = &mut self.state
        {
            self.context_counter = self.context_counter.wrapping_add(1);
            let frame = encap::unregister_session(*session_handle, self.context_counter);
            if let Err(err) = write_frame(stream, &frame, self.io_timeout).await {
                warn!(error = %err, "unregister failed");
            }
        }
        self.state = State::Closed;
    }
}

async fn exchange(stream: &mut TcpStream, frame: &[u8], io_timeout: Duration) -> Result<Vec<u8>> {
    write_frame(stream, frame, io_timeout).await?;
    read_frame(stream, io_timeout).await
}

async fn write_frame(stream: &mut TcpStream, frame: &[u8], io_timeout: Duration) -> Result<()> {
    match timeout(io_timeout, stream.write_all(frame)).await {
        Err(_) => Err(ClientError::Timeout),
        Ok(Err(err)) => Err(err.into()),
        Ok(Ok(())) => Ok(()),
    }
}

/// Read exactly one frame: the 24-byte header, then `header.length` bytes.
async fn read_frame(stream: &mut TcpStream, io_timeout: Duration) -> Result<Vec<u8>> {
    let mut header = [0u8; encap::HEADER_LEN];
    read_exact(stream, &mut header, io_timeout).await?;
    let parsed = encap::Header::parse(&header)?;
    let mut full = Vec::with_capacity(encap::HEADER_LEN + parsed.length as usize);
    full.extend_from_slice(&header);
    if parsed.length > 0 {
        let mut body = vec![0u8; parsed.length as usize];
        read_exact(stream, &mut body, io_timeout).await?;
        full.extend_from_slice(&body);
    }
    Ok(full)
}

async fn read_exact(stream: &mut TcpStream, buf: &mut [u8], io_timeout: Duration) -> Result<()> {
    match timeout(io_timeout, stream.read_exact(buf)).await {
        Err(_) => Err(ClientError::Timeout),
        Ok(Err(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ClientError::ConnectionClosed)
        }
        Ok(Err(err)) => Err(err.into()),
        Ok(Ok(_)) => Ok(()),
    }
}
