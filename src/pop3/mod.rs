//! POP3 retrieval side
//!
//! Serves the shared [`MailStore`](crate::MailStore) to mail clients.
//! Any user name and password are accepted.

pub mod command;
mod op;
pub mod session;

pub use command::{Pop3Action, Pop3Command};
pub use session::{Pop3Session, Pop3State};
