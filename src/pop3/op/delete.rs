use super::{err, ok, parse_number};
use crate::pop3::Pop3Session;
use tracing::debug;

impl Pop3Session {
    /// `DELE n` removes the message from the store right away.
    pub(crate) async fn handle_dele(&self, params: &str) -> String {
        let Some(index) = parse_number(params).and_then(|n| n.checked_sub(1)) else {
            return err("Invalid message index");
        };

        match self.store.delete(index).await {
            Ok(()) => ok("Message deleted"),
            Err(e) => {
                debug!(error = %e, "DELE failed");
                err("Invalid message index")
            }
        }
    }
}
