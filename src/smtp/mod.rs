//! SMTP receiving side
//!
//! Accepts mail from a client and files it into the shared
//! [`MailStore`](crate::MailStore). Nothing is ever relayed.

pub mod command;
pub mod reply;
pub mod session;

pub use command::SmtpAction;
pub use reply::SmtpReply;
pub use session::{SmtpSession, SmtpState};
