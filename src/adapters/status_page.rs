//! Read-only status page over plain HTTP.
//!
//! Serves the latest [`StatusReport`] as JSON.  The server is a
//! cooperative task on the main executor: the listener and client sockets
//! are non-blocking, and every "nothing to do yet" path awaits an
//! `async-io-mini` timer so the sampler keeps its schedule.
//!
//! | Request              | Response                 |
//! |----------------------|--------------------------|
//! | `GET /`              | 200, status JSON         |
//! | `GET /status.json`   | 200, status JSON         |
//! | other `GET`          | 404                      |
//! | anything else        | 405                      |
//!
//! One client is served at a time; the page is polled by humans.

use core::time::Duration;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use log::{debug, info, warn};

use super::utils::retry_bounded;
use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::status::StatusBoard;

const REQUEST_BUF_SIZE: usize = 512;
/// Give up on a client that has not sent a request line after this many
/// read polls.
const MAX_READ_POLLS: u32 = 50;
const CLIENT_POLL: Duration = Duration::from_millis(10);

/// One HTTP response, ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn text(status: u16, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            content_type: "text/plain",
            body: reason.as_bytes().to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason,
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

/// Route one request line (`GET /path HTTP/1.1`) against `board`.
pub fn respond(board: &StatusBoard, request_line: &str) -> Response {
    let mut parts = request_line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next()) {
        (Some(m), Some(p)) => (m, p),
        _ => return Response::text(400, "Bad Request"),
    };
    if method != "GET" {
        return Response::text(405, "Method Not Allowed");
    }
    let path = path.split('?').next().unwrap_or(path);
    match path {
        "/" | "/status.json" => match serde_json::to_vec(&*board.current_status()) {
            Ok(body) => Response {
                status: 200,
                reason: "OK",
                content_type: "application/json",
                body,
            },
            Err(e) => {
                warn!("STATUS: encode failed: {}", e);
                Response::text(500, "Internal Server Error")
            }
        },
        _ => Response::text(404, "Not Found"),
    }
}

/// Bind the listener, at most `socket_bind_attempts` times.
pub fn bind_listener(config: &SystemConfig) -> Result<TcpListener, CommsError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.status_port));
    let listener = retry_bounded(
        "status bind",
        config.socket_bind_attempts,
        Duration::from_millis(config.retry_delay_ms as u64),
        |_| TcpListener::bind(addr),
    )
    .map_err(|_| CommsError::SocketBindFailed)?;
    listener
        .set_nonblocking(true)
        .map_err(|_| CommsError::SocketBindFailed)?;
    info!("STATUS: listening on {}", addr);
    Ok(listener)
}

pub struct StatusServer<'a> {
    board: &'a StatusBoard,
    listener: TcpListener,
    accept_poll: Duration,
    served: u32,
}

impl<'a> StatusServer<'a> {
    pub fn new(board: &'a StatusBoard, listener: TcpListener, config: &SystemConfig) -> Self {
        Self {
            board,
            listener,
            accept_poll: Duration::from_millis(config.status_poll_ms as u64),
            served: 0,
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Requests answered so far.
    pub fn served(&self) -> u32 {
        self.served
    }

    /// Accept loop.  Never returns.
    pub async fn run(&mut self) {
        loop {
            self.poll_once().await;
        }
    }

    /// Serve at most one pending client, or wait one accept poll.
    pub async fn poll_once(&mut self) {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                debug!("STATUS: client {}", peer);
                if let Err(e) = self.serve(stream).await {
                    warn!("STATUS: client {} dropped: {}", peer, e);
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                async_io_mini::Timer::after(self.accept_poll).await;
            }
            Err(e) => {
                warn!("STATUS: accept error: {}", e);
                async_io_mini::Timer::after(self.accept_poll).await;
            }
        }
    }

    async fn serve(&mut self, mut stream: TcpStream) -> std::io::Result<()> {
        stream.set_nonblocking(true)?;

        let mut buf = [0u8; REQUEST_BUF_SIZE];
        let mut len = 0;
        let mut polls = 0;
        let line_end = loop {
            if let Some(pos) = buf[..len].windows(2).position(|w| w == b"\r\n") {
                break pos;
            }
            if len == buf.len() {
                return Err(std::io::Error::other("request line too long"));
            }
            match stream.read(&mut buf[len..]) {
                Ok(0) => return Err(ErrorKind::UnexpectedEof.into()),
                Ok(n) => len += n,
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    polls += 1;
                    if polls > MAX_READ_POLLS {
                        return Err(ErrorKind::TimedOut.into());
                    }
                    async_io_mini::Timer::after(CLIENT_POLL).await;
                }
                Err(e) => return Err(e),
            }
        };

        let request_line = String::from_utf8_lossy(&buf[..line_end]);
        let response = respond(self.board, &request_line).to_bytes();
        write_all_polling(&mut stream, &response).await?;
        self.served += 1;
        Ok(())
    }
}

async fn write_all_polling(stream: &mut TcpStream, mut data: &[u8]) -> std::io::Result<()> {
    let mut polls = 0;
    while !data.is_empty() {
        match stream.write(data) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                polls += 1;
                if polls > MAX_READ_POLLS {
                    return Err(ErrorKind::TimedOut.into());
                }
                async_io_mini::Timer::after(CLIENT_POLL).await;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
