use super::{err, listing, ok, parse_number};
use crate::pop3::Pop3Session;
use tracing::debug;

impl Pop3Session {
    pub(crate) async fn handle_stat(&self) -> String {
        let messages = self.store.list().await;
        let size: usize = messages.iter().map(|m| m.byte_stuff().len()).sum();
        ok(&format!("{} {size}", messages.len()))
    }

    /// `LIST [n]`. The argument is used directly as a store position,
    /// then reported back as `n + 1`.
    pub(crate) async fn handle_list(&self, params: &str) -> String {
        if params.is_empty() {
            let messages = self.store.list().await;
            return listing(
                &format!("{} messages", messages.len()),
                messages
                    .iter()
                    .enumerate()
                    .map(|(i, m)| format!("{} {}", i + 1, m.byte_stuff().len())),
            );
        }

        let Some(index) = parse_number(params) else {
            return err("Invalid message index");
        };
        match self.store.get(index).await {
            Ok(message) => ok(&format!("{} {}", index + 1, message.byte_stuff().len())),
            Err(e) => {
                debug!(error = %e, "LIST failed");
                err("Server error while generating listing")
            }
        }
    }

    pub(crate) async fn handle_uidl(&self, params: &str) -> String {
        if params.is_empty() {
            let messages = self.store.list().await;
            return listing(
                "",
                messages
                    .iter()
                    .enumerate()
                    .map(|(i, m)| format!("{} {}", i + 1, m.uid())),
            );
        }

        let Some(number) = parse_number(params) else {
            return err("Invalid message index");
        };
        let Some(index) = number.checked_sub(1) else {
            return err(&format!("No message at index {number}"));
        };
        match self.store.get(index).await {
            Ok(message) => ok(&format!("{number} {}", message.uid())),
            Err(_) => err(&format!("No message at index {number}")),
        }
    }
}
