use super::{err, parse_number};
use crate::pop3::Pop3Session;

impl Pop3Session {
    /// `RETR n`: the byte-stuffed message followed by the terminator.
    pub(crate) async fn handle_retr(&self, params: &str) -> String {
        let Some(number) = parse_number(params) else {
            return err("No such message");
        };
        let Some(index) = number.checked_sub(1) else {
            return err(&format!("No message at index {number}"));
        };

        match self.store.get(index).await {
            Ok(message) => {
                let stuffed = message.byte_stuff();
                format!("+OK {} octets\r\n{stuffed}\r\n.\r\n", stuffed.len())
            }
            Err(_) => err(&format!("No message at index {number}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::message::Message;
    use crate::pop3::Pop3Session;
    use crate::store::MailStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn retr_sends_stuffed_message() {
        let store = Arc::new(MailStore::new(3));
        let mut message = Message::new();
        message.set("Message-Id", "<1@x>");
        message.append("before");
        message.append("\r\n.\r\n");
        message.append("after");
        store.add(message).await;

        let session = Pop3Session::new(store, "pop.test");
        let reply = session.handle_retr("1").await;

        let stuffed = "Message-Id: <1@x>\r\n\r\nbefore\n\r\n..\r\n\nafter";
        assert_eq!(
            reply,
            format!("+OK {} octets\r\n{stuffed}\r\n.\r\n", stuffed.len())
        );
    }

    #[tokio::test]
    async fn retr_rejects_bad_numbers() {
        let store = Arc::new(MailStore::new(3));
        store.add(Message::sample()).await;
        let session = Pop3Session::new(store, "pop.test");

        assert_eq!(session.handle_retr("0").await, "-ERR No message at index 0\r\n");
        assert_eq!(session.handle_retr("2").await, "-ERR No message at index 2\r\n");
        assert_eq!(session.handle_retr("").await, "-ERR No such message\r\n");
        assert_eq!(session.handle_retr("first").await, "-ERR No such message\r\n");
    }
}
