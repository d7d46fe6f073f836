use clap::Parser;
use log::info;
use pong_server::config::ServerConfig;
use pong_server::network::Server;

#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative two-player Pong server", long_about = None)]
struct Args {
    /// Host or interface to listen on
    #[arg(short = 'H', long, default_value = "localhost")]
    host: String,

    /// TCP port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ServerConfig::new(args.host, args.port);
    let server = Server::bind(&config).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
