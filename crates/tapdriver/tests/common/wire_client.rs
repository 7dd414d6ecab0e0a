//! Minimal HTTP/1.1 client speaking the wire protocol over a raw socket.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::Value;

pub struct WireClient {
    addr: SocketAddr,
}

#[derive(Debug)]
pub struct WireReply {
    pub http_status: u16,
    pub body: String,
}

impl WireReply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|err| panic!("body is not JSON ({err}): {}", self.body))
    }

    /// The envelope's `status` field.
    pub fn status_code(&self) -> i64 {
        self.json()["status"].as_i64().expect("status field")
    }

    pub fn value(&self) -> Value {
        self.json()["value"].clone()
    }
}

impl WireClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn get(&self, path: &str) -> WireReply {
        self.send("GET", path, "")
    }

    pub fn post(&self, path: &str, body: &str) -> WireReply {
        self.send("POST", path, body)
    }

    pub fn delete(&self, path: &str) -> WireReply {
        self.send("DELETE", path, "")
    }

    pub fn send(&self, method: &str, path: &str, body: &str) -> WireReply {
        let mut stream = TcpStream::connect(self.addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .expect("read timeout");
        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            self.addr,
            body.len()
        );
        stream.write_all(request.as_bytes()).expect("write request");

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).expect("read response");
        let raw = String::from_utf8(raw).expect("utf-8 response");
        let (head, body) = raw.split_once("\r\n\r\n").expect("response head");
        let http_status = head
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("status line");
        WireReply {
            http_status,
            body: body.to_string(),
        }
    }
}
