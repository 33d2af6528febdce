//! POP3 command handlers and reply formatting

mod delete;
mod fetch;
mod list;

use crate::PRODUCT;

pub fn ok(text: &str) -> String {
    if text.is_empty() {
        "+OK\r\n".to_string()
    } else {
        format!("+OK {text}\r\n")
    }
}

pub fn err(text: &str) -> String {
    format!("-ERR {text}\r\n")
}

/// A `+OK` line followed by `lines` and the terminating `.`.
pub fn listing(first: &str, lines: impl IntoIterator<Item = String>) -> String {
    let mut reply = ok(first);
    for line in lines {
        reply.push_str(&line);
        reply.push_str("\r\n");
    }
    reply.push_str(".\r\n");
    reply
}

pub fn capabilities() -> String {
    listing(
        "List of capabilities follows",
        [
            "USER".to_string(),
            "UIDL".to_string(),
            format!("IMPLEMENTATION {PRODUCT} POP3"),
        ],
    )
}

/// A message number argument. Anything but a non-negative integer is
/// rejected.
fn parse_number(params: &str) -> Option<usize> {
    params.trim().parse().ok()
}
