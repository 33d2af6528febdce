//! Disposable SMTP and POP3 servers for testing mail clients
//!
//! Mailstand accepts whatever a client sends over SMTP, keeps the most
//! recent messages in a bounded in-memory [`MailStore`], and serves them
//! back over POP3. Nothing is delivered anywhere and no credentials are
//! checked: the point is to exercise a client's side of the protocols.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mailstand::{MailStore, Server, ServerConfig};
//!
//! # async fn run() -> mailstand::Result<()> {
//! let config = ServerConfig::default();
//! let store = Arc::new(MailStore::new(config.capacity));
//! let _smtp = Server::start_smtp(
//!     config.smtp_addr(),
//!     Arc::clone(&store),
//!     config.hostname.clone(),
//!     config.multiple_messages,
//! )
//! .await?;
//! let _pop3 = Server::start_pop3(config.pop3_addr(), store, config.hostname).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod io;
mod message;
pub mod pop3;
pub mod server;
pub mod smtp;
mod store;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use message::Message;
pub use pop3::Pop3Session;
pub use server::{CloseReason, Server, ServerStats, Session, serve_connection};
pub use smtp::SmtpSession;
pub use store::{MailStore, StoreEvent};

/// Product name announced in protocol banners.
pub const PRODUCT: &str = "Mailstand";
