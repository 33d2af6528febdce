//! Minimal line-oriented mail client for integration testing
//!
//! Talks to a running server over TCP, one command at a time:
//!
//! ```text
//!   connect -> banner -> (send line -> read reply)* -> close
//! ```
//!
//! SMTP replies may span several lines (`250-...` then `250 ...`).
//! POP3 multi-line replies end with a line consisting of a single `.`.

#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

pub struct LineClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl LineClient {
    /// Connect and return the client together with the server banner.
    pub async fn connect(addr: SocketAddr) -> (Self, String) {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
        };
        let banner = client.read_line().await.expect("no banner");
        (client, banner)
    }

    /// Next line without its terminator, `None` once the server closed.
    pub async fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.expect("read failed");
        if n == 0 {
            return None;
        }
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub async fn send(&mut self, line: &str) {
        self.send_raw(&format!("{line}\r\n")).await;
    }

    /// Write bytes exactly as given, for batched or unusual input.
    pub async fn send_raw(&mut self, data: &str) {
        self.writer
            .write_all(data.as_bytes())
            .await
            .expect("write failed");
        self.writer.flush().await.expect("flush failed");
    }

    /// Send a command and read a one-line reply.
    pub async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_line().await.expect("connection closed")
    }

    /// Read an SMTP reply, following `code-` continuation lines.
    pub async fn read_smtp_reply(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await.expect("connection closed");
            let last = line.as_bytes().get(3) != Some(&b'-');
            lines.push(line);
            if last {
                return lines;
            }
        }
    }

    /// Send an SMTP command and return the reply code.
    pub async fn smtp(&mut self, line: &str) -> u16 {
        self.send(line).await;
        smtp_code(&self.read_smtp_reply().await[0])
    }

    /// Send a POP3 command expecting a multi-line reply. Returns the
    /// status line and the body lines, without the final `.`.
    pub async fn pop3_multiline(&mut self, line: &str) -> (String, Vec<String>) {
        let status = self.command(line).await;
        let mut body = Vec::new();
        if !status.starts_with("+OK") {
            return (status, body);
        }
        loop {
            let line = self.read_line().await.expect("connection closed");
            if line == "." {
                return (status, body);
            }
            body.push(line);
        }
    }

    /// True once the server has closed the connection.
    pub async fn is_closed(&mut self) -> bool {
        self.read_line().await.is_none()
    }
}

pub fn smtp_code(line: &str) -> u16 {
    line.get(..3)
        .and_then(|code| code.parse().ok())
        .expect("reply without a code")
}
