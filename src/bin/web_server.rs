//! Web server for the avatar image API.
//!
//! ```bash
//! cargo run --bin web_server -- --config config/web.toml
//! ```

use clap::Parser;
use log::info;

use avatar_stego::common::config::{load_config, WebConfig};
use avatar_stego::common::logging::init_logger;
use avatar_stego::server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML); built-in defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen address from the configuration
    #[arg(long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    let mut config: WebConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => WebConfig::default(),
    };
    if let Some(address) = args.address {
        config.server.address = address;
    }

    info!("🚀 Initializing web server...");

    let app = server::router(&config);

    let addr = config.server.address.as_str();
    info!("🌐 Web server running on http://{}", addr);
    info!("📡 API endpoints: /api/avatar/embed, /api/avatar/extract, /api/capacity");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
