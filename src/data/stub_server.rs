//! Minimal HTTP/1.1 server for exercising the blocking clients in tests.
//!
//! Replies are served in order, one per connection; the last reply repeats
//! once the script runs out. Every request line is recorded.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use reqwest::blocking::Client;

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start(replies: Vec<(u16, String)>) -> Self {
        assert!(!replies.is_empty(), "stub server needs at least one reply");
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for (served, stream) in listener.incoming().enumerate() {
                let Ok(stream) = stream else { continue };
                let (status, body) = &replies[served.min(replies.len() - 1)];
                answer(stream, *status, body, &seen);
            }
        });

        Self { base_url, requests }
    }

    /// Request lines received so far, e.g. `GET /path?query HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Client that never routes loopback traffic through an environment proxy.
pub fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

fn answer(mut stream: TcpStream, status: u16, body: &str, seen: &Mutex<Vec<String>>) -> Option<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        head.extend_from_slice(&buf[..n]);
    }
    let line = String::from_utf8_lossy(&head).lines().next()?.to_string();
    // Recorded before replying so the client never observes a stale count.
    seen.lock().unwrap().push(line);

    let reason = if status == 200 { "OK" } else { "Error" };
    let reply = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(reply.as_bytes()).ok()?;
    stream.flush().ok()
}
