//! SMTP session state machine

use super::command::{SmtpAction, parse_command, parse_data_line};
use super::reply::SmtpReply;
use crate::message::Message;
use crate::server::Session;
use crate::store::MailStore;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Where an SMTP conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    /// Socket accepted, banner not sent yet.
    Connect,
    /// Waiting for `HELO` or `EHLO`.
    Greet,
    /// Ready for `MAIL FROM:`.
    Mail,
    /// Collecting recipients.
    Rcpt,
    /// Capturing message headers.
    DataHeader,
    /// Capturing the message body.
    DataBody,
    Quit,
}

impl SmtpState {
    #[must_use]
    pub const fn is_data(self) -> bool {
        matches!(self, Self::DataHeader | Self::DataBody)
    }
}

/// One SMTP conversation.
///
/// Builds a [`Message`] from the `DATA` section and files it into the
/// store when the client ends the data with a lone `.`. Only messages
/// carrying a `Message-Id` header are kept.
#[derive(Debug)]
pub struct SmtpSession {
    store: Arc<MailStore>,
    hostname: String,
    state: SmtpState,
    /// State entered once a message is complete.
    mail_end_state: SmtpState,
    working: Message,
    last_header: Option<String>,
    /// Raw data lines waiting for the terminating `.`.
    accumulated: String,
}

impl SmtpSession {
    /// Create a session filing messages into `store`.
    ///
    /// With `multiple_messages` off the session moves to
    /// [`SmtpState::Quit`] after the first message.
    #[must_use]
    pub fn new(store: Arc<MailStore>, hostname: impl Into<String>, multiple_messages: bool) -> Self {
        Self {
            store,
            hostname: hostname.into(),
            state: SmtpState::Connect,
            mail_end_state: if multiple_messages {
                SmtpState::Mail
            } else {
                SmtpState::Quit
            },
            working: Message::new(),
            last_header: None,
            accumulated: String::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> SmtpState {
        self.state
    }

    /// The message being captured.
    #[must_use]
    pub const fn working_message(&self) -> &Message {
        &self.working
    }

    /// Enter [`SmtpState::Greet`] and return the banner.
    pub fn greet(&mut self) -> SmtpReply {
        self.state = SmtpState::Greet;
        SmtpReply::greeting()
    }

    /// Process one chunk of input.
    ///
    /// Outside message data `input` is a single command. Inside message
    /// data it may hold part of a line or several lines; nothing is
    /// answered until the terminating `.` has arrived, at which point the
    /// buffered lines are replayed in order and only the last reply is
    /// returned.
    pub async fn receive(&mut self, input: &str) -> Option<SmtpReply> {
        if !self.state.is_data() {
            return self.step(parse_command(input)).await;
        }

        self.accumulated.push_str(input);
        self.accumulated.push_str("\r\n");
        if !input.lines().any(|line| line.trim() == ".") {
            return None;
        }
        self.replay().await
    }

    async fn replay(&mut self) -> Option<SmtpReply> {
        let buffered = std::mem::take(&mut self.accumulated);
        let mut lines = buffered.lines();
        let mut reply = Some(SmtpReply::bad_sequence());

        for line in lines.by_ref() {
            let action = parse_data_line(line, self.state == SmtpState::DataBody);
            reply = self.step(action).await;
            if matches!(self.state, SmtpState::Mail | SmtpState::Quit)
                || reply.as_ref().is_some_and(SmtpReply::is_error)
            {
                break;
            }
        }

        let dropped = lines.count();
        if dropped > 0 {
            debug!(dropped, "discarding input buffered after end of data");
        }

        if self.state.is_data() { None } else { reply }
    }

    async fn step(&mut self, action: SmtpAction) -> Option<SmtpReply> {
        let from = self.state;
        let reply = self.transition(action).await;
        trace!(?from, to = ?self.state, code = reply.as_ref().map(|r| r.code), "smtp transition");
        reply
    }

    async fn transition(&mut self, action: SmtpAction) -> Option<SmtpReply> {
        use SmtpAction as A;
        use SmtpState as S;

        let reply = match (self.state, action) {
            (S::DataHeader, A::BlankLine) => {
                self.state = S::DataBody;
                return None;
            }
            (S::DataBody, A::BlankLine) => return None,
            (S::DataHeader | S::DataBody, A::Unknown(input)) => {
                self.record(&input);
                return None;
            }
            (S::DataHeader | S::DataBody, A::DataEnd) => {
                self.state = self.mail_end_state;
                self.finish_message().await;
                SmtpReply::accepted()
            }
            (S::Rcpt, A::Data) => {
                self.state = S::DataHeader;
                SmtpReply::start_input()
            }
            (S::Greet, A::Helo(client)) => {
                self.state = S::Mail;
                SmtpReply::new(250, format!("Hello {client}"))
            }
            (S::Greet, A::Ehlo(client)) => {
                self.reset_message();
                self.state = S::Mail;
                SmtpReply::multiline(
                    250,
                    vec![format!("{} Hello {client}", self.hostname), "OK".to_string()],
                )
            }
            (S::Mail | S::Quit, A::Mail(_)) | (S::Rcpt, A::Rcpt(_)) => {
                self.state = S::Rcpt;
                SmtpReply::ok()
            }
            (_, A::Quit) => {
                self.state = S::Quit;
                SmtpReply::closing()
            }
            (state, A::Rset) => {
                self.reset_message();
                if state != S::Greet {
                    self.state = S::Mail;
                }
                SmtpReply::ok()
            }
            (_, A::Noop) => SmtpReply::ok(),
            (_, A::Help) => SmtpReply::new(211, "No help available"),
            (_, A::Expn(_) | A::Vrfy(_)) => {
                SmtpReply::new(252, "Cannot verify user, but will accept message")
            }
            (_, A::XList(index)) => self.xlist(&index).await,
            (_, A::Unknown(_)) => SmtpReply::not_recognized(),
            _ => SmtpReply::bad_sequence(),
        };
        Some(reply)
    }

    /// Store one captured line in the working message.
    fn record(&mut self, input: &str) {
        match self.state {
            SmtpState::DataHeader => {
                if let Some((name, value)) = input.split_once(':') {
                    let name = name.trim();
                    self.working.set(name, value.trim());
                    self.last_header = Some(name.to_string());
                } else if let Some(name) = &self.last_header {
                    self.working.append_header(name, input.trim());
                } else {
                    debug!(line = input, "continuation line before any header, ignored");
                }
            }
            SmtpState::DataBody => self.working.append(input),
            _ => {}
        }
    }

    /// Hand the working message to the store, if it qualifies, and start
    /// a fresh one.
    async fn finish_message(&mut self) {
        let message = std::mem::take(&mut self.working);
        self.reset_message();

        if message.has_header("Message-Id") {
            self.store.add(message).await;
        } else {
            info!(uid = message.uid(), "message has no Message-Id header, discarded");
        }
    }

    fn reset_message(&mut self) {
        self.working = Message::new();
        self.last_header = None;
        self.accumulated.clear();
    }

    /// `XLIST [index]`: show one stored message, or all of them.
    async fn xlist(&self, index: &str) -> SmtpReply {
        let messages = self.store.list().await;
        let selected: Vec<_> = if index.is_empty() {
            messages.iter().collect()
        } else {
            index
                .parse::<usize>()
                .ok()
                .and_then(|i| messages.get(i))
                .into_iter()
                .collect()
        };

        let mut lines = Vec::new();
        for message in selected {
            lines.push(format!("Message {}", message.uid()));
            lines.extend(message.to_string().lines().map(str::to_string));
        }
        lines.push(format!("There are {} messages", messages.len()));
        SmtpReply::multiline(250, lines)
    }
}

impl Session for SmtpSession {
    fn connected(&mut self) -> String {
        self.greet().format()
    }

    async fn handle_line(&mut self, line: &str) -> Option<String> {
        self.receive(line).await.map(|reply| reply.format())
    }

    fn is_finished(&self) -> bool {
        self.state == SmtpState::Quit
    }
}
