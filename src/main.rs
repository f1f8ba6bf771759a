//! State hub server
//!
//! # Usage
//!
//! ```bash
//! # Default port (10001), one push per second
//! state-hub
//!
//! # Custom port and period
//! state-hub --port 9000 --period-ms 250
//!
//! # Cap subscribers and drop unreachable ones
//! state-hub --max-subscribers 1000 --evict-unreachable
//! ```

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use state_hub::{HubServer, ServerConfig};

/// UDP state broadcast hub
#[derive(Parser, Debug)]
#[command(name = "state-hub")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// UDP port to listen on
    #[arg(short, long, default_value = "10001")]
    port: u16,

    /// Bind address (0.0.0.0 for all interfaces)
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Broadcast period in milliseconds
    #[arg(long, default_value = "1000")]
    period_ms: u64,

    /// State served before the first update
    #[arg(long, default_value = "started")]
    initial_state: String,

    /// Maximum number of subscribers (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_subscribers: usize,

    /// Remove subscribers whose pushes fail permanently
    #[arg(long, default_value = "false")]
    evict_unreachable: bool,

    /// Log hub statistics every N seconds (0 = disabled)
    #[arg(long, default_value = "0")]
    stats_interval: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::with_addr(SocketAddr::new(self.bind, self.port))
            .broadcast_period(Duration::from_millis(self.period_ms))
            .initial_state(self.initial_state.clone())
            .max_subscribers(self.max_subscribers)
            .evict_unreachable(self.evict_unreachable);

        if self.stats_interval > 0 {
            config = config.stats_interval(Duration::from_secs(self.stats_interval));
        }

        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let server = HubServer::bind(args.server_config()).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!(stats = ?server.stats().snapshot(), "State hub stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["state-hub"]);
        let config = args.server_config();

        assert_eq!(config.bind_addr, "0.0.0.0:10001".parse().unwrap());
        assert_eq!(config.broadcast_period, Duration::from_secs(1));
        assert_eq!(&config.initial_state[..], b"started");
        assert!(config.stats_interval.is_none());
    }

    #[test]
    fn test_custom_args() {
        let args = Args::parse_from([
            "state-hub",
            "--port",
            "9000",
            "--bind",
            "127.0.0.1",
            "--period-ms",
            "250",
            "--max-subscribers",
            "5",
            "--evict-unreachable",
            "--stats-interval",
            "10",
        ]);
        let config = args.server_config();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.broadcast_period, Duration::from_millis(250));
        assert_eq!(config.registry.max_subscribers, 5);
        assert!(config.evict_unreachable);
        assert_eq!(config.stats_interval, Some(Duration::from_secs(10)));
    }
}
