//! SMTP replies

use crate::PRODUCT;

/// A numbered SMTP reply, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    /// One entry per reply line, at least one.
    pub lines: Vec<String>,
}

impl SmtpReply {
    #[must_use]
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![text.into()],
        }
    }

    /// A multi-line reply. An empty `lines` renders as a single bare code.
    #[must_use]
    pub const fn multiline(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    #[must_use]
    pub fn greeting() -> Self {
        Self::new(220, format!("{PRODUCT} SMTP service ready"))
    }

    #[must_use]
    pub fn closing() -> Self {
        Self::new(221, format!("{PRODUCT} SMTP service closing transmission channel"))
    }

    #[must_use]
    pub fn start_input() -> Self {
        Self::new(354, "Start mail input; end with <CRLF>.<CRLF>")
    }

    #[must_use]
    pub fn accepted() -> Self {
        Self::new(250, "OK, message accepted for delivery")
    }

    #[must_use]
    pub fn not_recognized() -> Self {
        Self::new(500, "Command not recognized")
    }

    #[must_use]
    pub fn bad_sequence() -> Self {
        Self::new(503, "Bad sequence of commands")
    }

    /// 4xx and 5xx replies.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.code > 299
    }

    /// Wire format: `code-text` for every line but the last, `code text`
    /// for the last one, each CRLF terminated.
    #[must_use]
    pub fn format(&self) -> String {
        let Some((last, rest)) = self.lines.split_last() else {
            return format!("{}\r\n", self.code);
        };

        let mut result = String::new();
        for line in rest {
            result.push_str(&format!("{}-{line}\r\n", self.code));
        }
        result.push_str(&format!("{} {last}\r\n", self.code));
        result
    }
}
