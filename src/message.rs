//! In-memory mail message
//!
//! A [`Message`] is built up line by line while an SMTP client
//! transmits it, then handed to the [`MailStore`](crate::MailStore)
//! where POP3 clients can read it back.
//!
//! Headers keep the spelling the client used and the order in which
//! they first appeared. Each header maps to one or more values.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// The POP3 and SMTP end-of-data marker.
const TERMINATOR: &str = "\r\n.\r\n";
/// What [`TERMINATOR`] becomes inside a byte-stuffed body.
const STUFFED_TERMINATOR: &str = "\r\n..\r\n";

/// A single email: multi-valued headers plus a body.
///
/// # Examples
///
/// ```
/// use mailstand::Message;
///
/// let mut message = Message::new();
/// message.set("Subject", "Hello");
/// message.append("First line");
///
/// assert_eq!(message.header("subject"), Some(&["Hello".to_string()][..]));
/// assert_eq!(message.body(), "First line");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    uid: String,
    headers: IndexMap<String, Vec<String>>,
    body: String,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// Create an empty message with a fresh unique identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            headers: IndexMap::new(),
            body: String::new(),
        }
    }

    /// A small, complete message for previews and tests.
    #[must_use]
    pub fn sample() -> Self {
        let mut message = Self::new();
        message.append("Sample message for preview purposes.");
        message.add("Sender", "test@localhost");
        message.add("Subject", "Sample message");
        let message_id = format!("<{}@localhost>", message.uid);
        message.add("Message-Id", message_id);
        message
    }

    /// Unique identifier, reported by POP3 `UIDL`.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    #[must_use]
    pub const fn headers(&self) -> &IndexMap<String, Vec<String>> {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Values of the first header whose name matches `name`, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// True when no header and no body line has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body.is_empty()
    }

    /// Replace every value of `header` with `value`.
    pub fn set(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(header.into(), vec![value.into()]);
    }

    /// Add `value` after the existing values of `header`.
    pub fn add(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.headers
            .entry(header.into())
            .or_default()
            .push(value.into());
    }

    /// Concatenate `value` onto the last value of `header`.
    ///
    /// This is how folded (continuation) header lines are recorded: the
    /// header keeps the same number of values. Behaves like [`set`](Self::set)
    /// when the header is absent.
    pub fn append_header(&mut self, header: &str, value: &str) {
        match self.headers.get_mut(header).and_then(|values| values.last_mut()) {
            Some(last) => last.push_str(value),
            None => self.set(header, value),
        }
    }

    /// Append a line to the body.
    ///
    /// A `\n` separator goes in front of `line` unless the body is still
    /// empty, or `line` is itself empty or a lone newline. Appending `"\n"`
    /// therefore records a paragraph break.
    pub fn append(&mut self, line: &str) {
        if !self.body.is_empty() && !line.is_empty() && line != "\n" {
            self.body.push('\n');
        }
        self.body.push_str(line);
    }

    /// Render the message for POP3 `RETR`.
    ///
    /// Headers are joined by CRLF, followed by a blank line and the body.
    /// Every literal `CRLF . CRLF` inside the body becomes `CRLF .. CRLF`
    /// so the client cannot mistake it for the end of the response.
    #[must_use]
    pub fn byte_stuff(&self) -> String {
        let mut rendered = self.render_headers("\r\n");
        rendered.push_str("\r\n\r\n");
        rendered.push_str(&self.body.replace(TERMINATOR, STUFFED_TERMINATOR));
        rendered
    }

    fn render_headers(&self, separator: &str) -> String {
        self.headers
            .iter()
            .map(|(name, values)| format!("{name}: {}", values.join(", ")))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Plain rendering for logs and inspection, without any escaping.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.render_headers("\n"))?;
        writeln!(f)?;
        writeln!(f, "{}", self.body)
    }
}
