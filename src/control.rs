//! The control plane: a minimal HTTP/1.x listener that turns requests into driver commands.
//!
//! `GET /set?text=...&interval=...&times=...` and `POST /set` with the same fields as a form body
//! are accepted; see `command` for the fields. Every connection carries one request and gets a
//! bodiless response: 200 when the command was accepted (not necessarily displayed, since a later
//! command may replace it straight away), 400 when it was malformed, 404 for any other path and
//! 405 for any other method.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::command::Command;
use crate::display::driver::Handle;

/// Largest request body accepted.
pub const MAX_BODY: usize = 64 * 1024;

/// Longest request or header line read.
const MAX_LINE: u64 = 8 * 1024;

/// Most header lines read before a request is given up on.
const MAX_HEADERS: usize = 64;

/// How long a connection may stall, reading or writing, before it is dropped.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

/// The listening control plane, bound to the driver it was built with.
pub struct Server {
    listener: TcpListener,
    driver: Handle,
    timeout: Duration,
}

impl Server {
    pub fn bind<A: ToSocketAddrs>(addr: A, driver: Handle) -> io::Result<Self> {
        Ok(Server {
            listener: TcpListener::bind(addr)?,
            driver,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Extend this `Server` to drop connections that stall for longer than `timeout`.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, serving each on a thread of its own.
    pub fn serve(self) -> io::Result<()> {
        info!("listening on {}", self.listener.local_addr()?);
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                    continue;
                }
            };
            let driver = self.driver.clone();
            let timeout = self.timeout;
            let spawned = thread::Builder::new()
                .name("minishift-http".into())
                .spawn(move || {
                    if let Err(e) = handle_connection(stream, &driver, timeout) {
                        warn!("connection failed: {}", e);
                    }
                });
            if let Err(e) = spawned {
                error!("failed to start connection thread: {}", e);
            }
        }
        Ok(())
    }
}

/// A parsed request: just the parts the control plane looks at.
#[derive(Debug, PartialEq, Eq)]
struct HttpRequest {
    method: String,
    target: String,
    body: Vec<u8>,
}

fn handle_connection(stream: TcpStream, driver: &Handle, timeout: Duration) -> io::Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    let peer = stream.peer_addr()?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let status = match read_request(&mut reader)? {
        Some(req) => {
            let status = dispatch(&req.method, &req.target, &req.body, driver);
            info!("{} {} {} -> {}", peer, req.method, req.target, status.code());
            status
        }
        None => {
            warn!("{} sent a malformed request", peer);
            Status::BadRequest
        }
    };
    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.0 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status.code(),
        status.reason()
    )?;
    stream.flush()
}

/// Read one request. Returns `None` if it is not something we can make sense of.
fn read_request<R: BufRead>(reader: &mut R) -> io::Result<Option<HttpRequest>> {
    let mut line = String::new();
    reader.by_ref().take(MAX_LINE).read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
            (method.to_owned(), target.to_owned())
        }
        _ => return Ok(None),
    };

    let mut length = 0;
    for headers in 0.. {
        if headers == MAX_HEADERS {
            return Ok(None);
        }
        let mut header = String::new();
        if reader.by_ref().take(MAX_LINE).read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some(colon) = header.find(':') {
            if header[..colon].trim().eq_ignore_ascii_case("content-length") {
                length = match header[colon + 1..].trim().parse() {
                    Ok(length) => length,
                    Err(_) => return Ok(None),
                };
            }
        }
    }
    if length > MAX_BODY {
        return Ok(None);
    }

    let mut body = vec![0; length];
    reader.read_exact(&mut body)?;
    Ok(Some(HttpRequest {
        method,
        target,
        body,
    }))
}

/// Act on a request, returning the status to answer with. Only well-formed commands reach the
/// driver.
pub fn dispatch(method: &str, target: &str, body: &[u8], driver: &Handle) -> Status {
    let (path, query) = match target.find('?') {
        Some(q) => (&target[..q], &target[q + 1..]),
        None => (target, ""),
    };
    if path != "/set" {
        return Status::NotFound;
    }
    let form = match method {
        "GET" => query,
        "POST" => match std::str::from_utf8(body) {
            Ok(body) => body.trim_end_matches(|c: char| c == '\r' || c == '\n'),
            Err(_) => return Status::BadRequest,
        },
        _ => return Status::MethodNotAllowed,
    };
    match Command::from_query(form) {
        Ok(command) => {
            command.send(driver);
            Status::Ok
        }
        Err(e) => {
            warn!("rejected {} {}: {}", method, target, e);
            Status::BadRequest
        }
    }
}
