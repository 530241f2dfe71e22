//! Minimal HTTP/1.1 file server for integration tests.
//!
//! Every route serves one static body. HEAD answers with `Content-Length`,
//! GET honours `Range: bytes=N-` with `206 Partial Content` (`416` past the
//! end). Routes can be told to fail, lie about their size, ignore ranges, cut
//! bodies short or stall mid-body. Each connection carries one request
//! (`Connection: close`).

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Behaviour of one served path.
pub struct Route {
    body: Vec<u8>,
    status: Option<u16>,
    head_length: Option<u64>,
    ignore_range: bool,
    truncate_gets: usize,
    truncate_at: usize,
    body_delay: Duration,
    heads: AtomicUsize,
    gets: AtomicUsize,
}

impl Route {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            status: None,
            head_length: None,
            ignore_range: false,
            truncate_gets: 0,
            truncate_at: 0,
            body_delay: Duration::ZERO,
            heads: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        }
    }

    /// Answer every request with `status` and no body.
    pub fn failing(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Report `length` on HEAD instead of the real body size.
    pub fn head_length(mut self, length: u64) -> Self {
        self.head_length = Some(length);
        self
    }

    /// Always answer GET with `200 OK` and the full body.
    pub fn ignoring_range(mut self) -> Self {
        self.ignore_range = true;
        self
    }

    /// Close the connection after `at` body bytes on the first `gets` GETs.
    pub fn truncating(mut self, gets: usize, at: usize) -> Self {
        self.truncate_gets = gets;
        self.truncate_at = at;
        self
    }

    /// Wait between the response headers and the body of every GET.
    pub fn body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = delay;
        self
    }
}

/// Handle to a running server. The server lives until the process exits.
pub struct TestServer {
    base: String,
    routes: Arc<HashMap<String, Route>>,
}

impl TestServer {
    pub fn start<S: Into<String>>(routes: Vec<(S, Route)>) -> Self {
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.into(), route))
                .collect(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();

        let shared = Arc::clone(&routes);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &routes));
            }
        });

        Self {
            base: format!("http://127.0.0.1:{}", port),
            routes,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn heads(&self, path: &str) -> usize {
        self.routes[path].heads.load(Ordering::SeqCst)
    }

    pub fn gets(&self, path: &str) -> usize {
        self.routes[path].gets.load(Ordering::SeqCst)
    }
}

/// Deterministic, non-repeating-looking test payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let (method, path, range_start) = parse_request(&request);

    let Some(route) = routes.get(path) else {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    };

    if method.eq_ignore_ascii_case("HEAD") {
        route.heads.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = route.status {
            write_status(&mut stream, status);
            return;
        }
        let length = route.head_length.unwrap_or(route.body.len() as u64);
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            length
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if method.eq_ignore_ascii_case("GET") {
        let nth = route.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = route.status {
            write_status(&mut stream, status);
            return;
        }

        let total = route.body.len();
        if let Some(start) = range_start {
            if !route.ignore_range && start > 0 && start as usize >= total {
                let response = format!(
                    "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    total
                );
                let _ = stream.write_all(response.as_bytes());
                return;
            }
        }

        let (status_line, slice) = match range_start {
            Some(start) if !route.ignore_range => {
                let start = (start as usize).min(total);
                ("206 Partial Content", &route.body[start..])
            }
            _ => ("200 OK", &route.body[..]),
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            slice.len()
        );
        if stream.write_all(response.as_bytes()).is_err() {
            return;
        }
        let _ = stream.flush();

        if !route.body_delay.is_zero() {
            thread::sleep(route.body_delay);
        }

        let sent = if nth < route.truncate_gets {
            &slice[..route.truncate_at.min(slice.len())]
        } else {
            slice
        };
        let _ = stream.write_all(sent);
        let _ = stream.flush();
        return;
    }

    write_status(&mut stream, 405);
}

fn write_status(stream: &mut TcpStream, status: u16) {
    let reason = match status {
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status, reason
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Read until the end of the request headers.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if data.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if data.len() > 64 * 1024 {
            return None;
        }
    }
    String::from_utf8(data).ok()
}

/// Returns (method, path, start of an open `bytes=N-` range).
fn parse_request(request: &str) -> (&str, &str, Option<u64>) {
    let mut lines = request.lines();
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("");
    let path = request_line.next().unwrap_or("/");

    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(bounds) = value.strip_prefix("bytes=") {
                    if let Some((start, _)) = bounds.split_once('-') {
                        range = start.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (method, path, range)
}
