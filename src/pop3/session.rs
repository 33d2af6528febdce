//! POP3 session state machine

use super::command::{Pop3Action, Pop3Command};
use super::op;
use crate::PRODUCT;
use crate::server::Session;
use crate::store::MailStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pop3State {
    /// Waiting for credentials, which are never checked.
    Authorization,
    Transaction,
    Quit,
}

/// One POP3 conversation over the shared store.
///
/// Message numbers seen by the client are 1-based positions in the
/// store at the time of the command. `DELE` removes the message at once,
/// so numbers shift after a delete and `RSET` has nothing to undo.
#[derive(Debug)]
pub struct Pop3Session {
    pub(super) store: Arc<MailStore>,
    hostname: String,
    session_id: Uuid,
    state: Pop3State,
    last_action: Option<Pop3Action>,
    last_params: String,
}

impl Pop3Session {
    #[must_use]
    pub fn new(store: Arc<MailStore>, hostname: impl Into<String>) -> Self {
        Self {
            store,
            hostname: hostname.into(),
            session_id: Uuid::new_v4(),
            state: Pop3State::Authorization,
            last_action: None,
            last_params: String::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> Pop3State {
        self.state
    }

    /// The most recently parsed command.
    #[must_use]
    pub const fn last_action(&self) -> Option<Pop3Action> {
        self.last_action
    }

    #[must_use]
    pub fn last_params(&self) -> &str {
        &self.last_params
    }

    /// Greeting with a timestamp unique to this session.
    #[must_use]
    pub fn banner(&self) -> String {
        format!(
            "+OK {PRODUCT} POP3 ready <{}.{}@{}>\r\n",
            self.session_id,
            Utc::now().timestamp_millis(),
            self.hostname
        )
    }

    /// Process one command line and return the full reply.
    pub async fn receive(&mut self, line: &str) -> String {
        let command = Pop3Command::parse(line, self.state);
        self.last_action = Some(command.action);
        self.last_params.clone_from(&command.params);

        let from = self.state;
        let reply = self.perform(command.action, &command.params).await;
        trace!(?from, to = ?self.state, action = ?command.action, "pop3 transition");
        reply
    }

    async fn perform(&mut self, action: Pop3Action, params: &str) -> String {
        use Pop3Action as A;
        use Pop3State as S;

        match (self.state, action) {
            (_, A::Quit) => {
                self.state = S::Quit;
                op::ok("Goodbye")
            }
            (_, A::Capa) => op::capabilities(),
            (_, A::Invalid) => op::err("Unknown/invalid command"),
            (S::Authorization, A::User) => op::ok(""),
            (S::Authorization, A::Pass | A::Apop) => {
                self.state = S::Transaction;
                op::ok("mailbox ready")
            }
            (S::Transaction, A::Stat) => self.handle_stat().await,
            (S::Transaction, A::List) => self.handle_list(params).await,
            (S::Transaction, A::Uidl) => self.handle_uidl(params).await,
            (S::Transaction, A::Retr) => self.handle_retr(params).await,
            (S::Transaction, A::Dele) => self.handle_dele(params).await,
            (S::Transaction, A::Noop) => op::ok(""),
            (S::Transaction, A::Rset) => op::ok("Nothing to restore"),
            (S::Transaction, A::Top) => op::err("Unsupported command"),
            _ => op::err("Invalid command for this state"),
        }
    }
}

impl Session for Pop3Session {
    fn connected(&mut self) -> String {
        self.state = Pop3State::Authorization;
        self.banner()
    }

    async fn handle_line(&mut self, line: &str) -> Option<String> {
        Some(self.receive(line).await)
    }

    fn is_finished(&self) -> bool {
        self.state == Pop3State::Quit
    }
}
