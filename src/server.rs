//! TCP listeners and the per-connection loop
//!
//! Each accepted connection gets its own task. The task owns the
//! protocol [`Session`], reads one line at a time, hands it to the
//! session and writes the reply before reading the next line, so
//! replies always go out in request order:
//!
//! ```text
//!   accept -> greeting -> (read line -> session -> write reply)* -> close
//! ```
//!
//! The connection is closed once the session reports it is finished
//! (after `QUIT`) or when the peer goes away.

use crate::error::{Error, Result};
use crate::io::{read_line, write_line};
use crate::pop3::Pop3Session;
use crate::smtp::SmtpSession;
use crate::store::MailStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// One protocol conversation, driven line by line by [`serve_connection`].
pub trait Session: Send {
    /// Called once when the connection becomes active. Returns the banner.
    fn connected(&mut self) -> String;

    /// Process one input line. `None` means nothing is sent back.
    fn handle_line(&mut self, line: &str) -> impl Future<Output = Option<String>> + Send;

    /// True once the conversation is over and the connection should close.
    fn is_finished(&self) -> bool;
}

/// Why a connection ended.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CloseReason {
    /// The client asked to quit.
    Quit,
    /// The client closed its end of the connection.
    ClosedByClient,
}

/// Connection counters for one server.
#[derive(Debug, Default)]
pub struct ServerStats {
    active: AtomicUsize,
    total: AtomicUsize,
}

impl ServerStats {
    /// Connections currently open.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Connections accepted since the server started.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    fn open(self: &Arc<Self>) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard(Arc::clone(self))
    }
}

/// Decrements the active count when the connection task ends.
struct ConnectionGuard(Arc<ServerStats>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Run one session over `stream` until it finishes or the peer leaves.
///
/// Works over any byte stream, which lets tests drive a session through
/// `tokio::io::duplex`.
///
/// # Errors
///
/// Returns the underlying I/O error if reading or writing fails.
pub async fn serve_connection<S, E>(stream: S, mut session: E) -> std::io::Result<CloseReason>
where
    S: AsyncRead + AsyncWrite + Send,
    E: Session,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let banner = session.connected();
    trace!(reply = %banner, "write");
    write_line(&mut write_half, &banner).await?;

    loop {
        let Some(line) = read_line(&mut reader).await? else {
            return Ok(CloseReason::ClosedByClient);
        };
        trace!(%line, "read");

        if let Some(reply) = session.handle_line(&line).await {
            trace!(reply = %reply.trim_end(), "write");
            write_line(&mut write_half, &reply).await?;
        }

        if session.is_finished() {
            write_half.shutdown().await?;
            return Ok(CloseReason::Quit);
        }
    }
}

/// A running SMTP or POP3 listener.
///
/// The accept loop stops when the `Server` is stopped or dropped.
/// Connections that were already accepted run to completion.
#[derive(Debug)]
pub struct Server {
    label: &'static str,
    local_addr: SocketAddr,
    stats: Arc<ServerStats>,
    handle: JoinHandle<()>,
}

impl Server {
    /// Start an SMTP server that files messages into `store`.
    ///
    /// With `multiple_messages` off, each session ends after its first
    /// message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if `addr` cannot be bound.
    pub async fn start_smtp(
        addr: SocketAddr,
        store: Arc<MailStore>,
        hostname: impl Into<String>,
        multiple_messages: bool,
    ) -> Result<Self> {
        let hostname = hostname.into();
        Self::start("SMTP", addr, move || {
            SmtpSession::new(Arc::clone(&store), hostname.clone(), multiple_messages)
        })
        .await
    }

    /// Start a POP3 server that serves the messages in `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if `addr` cannot be bound.
    pub async fn start_pop3(
        addr: SocketAddr,
        store: Arc<MailStore>,
        hostname: impl Into<String>,
    ) -> Result<Self> {
        let hostname = hostname.into();
        Self::start("POP3", addr, move || {
            Pop3Session::new(Arc::clone(&store), hostname.clone())
        })
        .await
    }

    async fn start<F, E>(label: &'static str, addr: SocketAddr, new_session: F) -> Result<Self>
    where
        F: Fn() -> E + Send + 'static,
        E: Session + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        info!(protocol = label, %local_addr, "server started");

        let stats = Arc::new(ServerStats::default());
        let handle = tokio::spawn(accept_loop(label, listener, Arc::clone(&stats), new_session));

        Ok(Self {
            label,
            local_addr,
            stats,
            handle,
        })
    }

    /// The address actually bound, useful after binding port 0.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Stop accepting connections.
    pub fn stop(&self) {
        if !self.handle.is_finished() {
            info!(protocol = self.label, "server shutting down");
            self.handle.abort();
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop<F, E>(
    label: &'static str,
    listener: TcpListener,
    stats: Arc<ServerStats>,
    new_session: F,
) where
    F: Fn() -> E + Send + 'static,
    E: Session + 'static,
{
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(protocol = label, error = %e, "accept failed, listener stopping");
                break;
            }
        };

        let session = new_session();
        let guard = stats.open();
        tokio::spawn(async move {
            let _guard = guard;
            debug!(protocol = label, %peer, "connection opened");
            match serve_connection(stream, session).await {
                Ok(reason) => debug!(protocol = label, %peer, ?reason, "connection closed"),
                Err(e) => warn!(protocol = label, %peer, error = %e, "connection failed"),
            }
        });
    }
}
