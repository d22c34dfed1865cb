use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative room-based Pong server")]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value_t = 256)]
    max_clients: usize,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            bind_addr: format!("{}:{}", args.host, args.port),
            tick_rate: args.tick_rate,
            max_clients: args.max_clients,
            client_timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig::from(Args::parse());
    info!("Starting pong server on {}", config.bind_addr);

    let mut server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
