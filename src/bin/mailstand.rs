#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Run disposable SMTP and POP3 servers sharing one mail store

use clap::Parser;
use mailstand::{MailStore, Message, Server, ServerConfig, StoreEvent};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailstand")]
#[command(about = "Disposable SMTP and POP3 servers for testing mail clients")]
struct Args {
    /// Address to listen on
    #[arg(long)]
    host: Option<IpAddr>,

    /// SMTP port (0 picks a free port)
    #[arg(long)]
    smtp_port: Option<u16>,

    /// POP3 port (0 picks a free port)
    #[arg(long)]
    pop3_port: Option<u16>,

    /// Host name announced in banners
    #[arg(long)]
    hostname: Option<String>,

    /// Number of messages to keep
    #[arg(long)]
    capacity: Option<usize>,

    /// End each SMTP session after its first message
    #[arg(long)]
    single_message: bool,

    /// Print arriving messages as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Command-line flags take precedence over the environment.
    fn apply(&self, mut config: ServerConfig) -> mailstand::Result<ServerConfig> {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.smtp_port {
            config.smtp_port = port;
        }
        if let Some(port) = self.pop3_port {
            config.pop3_port = port;
        }
        if let Some(hostname) = &self.hostname {
            config.hostname.clone_from(hostname);
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if self.single_message {
            config.multiple_messages = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.apply(ServerConfig::from_env()?)?;

    let store = Arc::new(MailStore::new(config.capacity));
    let events = store.subscribe();

    let smtp = Server::start_smtp(
        config.smtp_addr(),
        Arc::clone(&store),
        config.hostname.clone(),
        config.multiple_messages,
    )
    .await?;
    let pop3 = Server::start_pop3(config.pop3_addr(), store, config.hostname.clone()).await?;

    println!("SMTP listening on {}", smtp.local_addr());
    println!("POP3 listening on {}", pop3.local_addr());

    tokio::select! {
        result = print_arrivals(events, args.json) => result?,
        result = tokio::signal::ctrl_c() => result?,
    }

    smtp.stop();
    pop3.stop();
    let (smtp_stats, pop3_stats) = (smtp.stats(), pop3.stats());
    tracing::info!(
        smtp_connections = smtp_stats.total(),
        pop3_connections = pop3_stats.total(),
        "shutting down"
    );
    Ok(())
}

async fn print_arrivals(
    mut events: broadcast::Receiver<StoreEvent>,
    json: bool,
) -> anyhow::Result<()> {
    loop {
        match events.recv().await {
            Ok(StoreEvent::Added(message)) => {
                if json {
                    println!("{}", serde_json::to_string(&*message)?);
                } else {
                    print_summary(&message);
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "output fell behind, some arrivals not shown");
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

fn print_summary(message: &Message) {
    let first = |name: &str| {
        message
            .header(name)
            .and_then(<[String]>::first)
            .map_or("-", String::as_str)
            .to_string()
    };

    println!(
        "{:<36} {:<30} {}",
        message.uid(),
        truncate(&first("From"), 28),
        truncate(&first("Subject"), 40),
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
