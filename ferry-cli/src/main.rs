use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use ferry_broker::{BrokerConfig, serve};
use ferry_peer::{
    ChunkSize, DEFAULT_CHUNK_SIZE, DEFAULT_SIGNALING_URL, ExchangeMode, FileReceiver, FileSender,
    PeerConfig, PeerError, Progress, SaveLocation, TransferSummary, TransportConfig,
};
use std::io::Write;
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ferry", version, about = "Peer-to-peer file transfer")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Offer a file to one receiver.
    Send {
        path: PathBuf,

        #[command(flatten)]
        peer: PeerArgs,
    },
    /// Receive a file by transfer id (or `<id>|<offer>` in manual mode).
    Receive {
        address: String,

        #[arg(default_value = ".")]
        save_path: PathBuf,

        #[command(flatten)]
        peer: PeerArgs,
    },
    /// Run the signaling broker.
    Signal {
        #[arg(short, long, default_value_t = BrokerConfig::DEFAULT_PORT)]
        port: u16,

        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,
    },
}

#[derive(Args)]
struct PeerArgs {
    /// STUN server, e.g. stun.example.org:3478
    #[arg(long)]
    stun: Option<String>,

    /// TURN server, e.g. turn.example.org:3478
    #[arg(long)]
    turn: Option<String>,

    #[arg(long, default_value = DEFAULT_SIGNALING_URL)]
    signaling: String,

    /// Room to meet in; defaults to the file id.
    #[arg(long)]
    room: Option<String>,

    /// Exchange descriptions by copy and paste instead of the broker.
    #[arg(long)]
    manual: bool,

    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

impl PeerArgs {
    fn into_config(self) -> PeerConfig {
        let exchange = if self.manual {
            ExchangeMode::Manual
        } else {
            ExchangeMode::Broker {
                url: self.signaling,
                room_id: self.room,
            }
        };
        PeerConfig {
            transport: TransportConfig::from_flags(self.stun.as_deref(), self.turn.as_deref()),
            chunk_size: ChunkSize::new(self.chunk_size),
            exchange,
            ..PeerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Send { path, peer } => send(path, peer.into_config()).await,
        Commands::Receive {
            address,
            save_path,
            peer,
        } => receive(&address, save_path, peer.into_config()).await,
        Commands::Signal { port, bind } => {
            let config = BrokerConfig {
                bind_addr: bind,
                port,
                ..BrokerConfig::default()
            };
            println!(
                "{}",
                format!("Signaling on ws://{}/ws", config.socket_addr())
                    .green()
                    .bold()
            );
            serve(config).await.context("Signaling server stopped")
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn send(path: PathBuf, config: PeerConfig) -> Result<()> {
    let manual = matches!(config.exchange, ExchangeMode::Manual);
    let sender = FileSender::new(path, config);

    println!("{} {}", "File ID:".cyan().bold(), sender.file_id().bold());
    if !manual {
        println!(
            "   Receive with: {}",
            format!("ferry receive {}", sender.file_id()).yellow()
        );
    }

    let renderer = render_progress(sender.progress());
    let result = sender.run().await;
    renderer.abort();
    report(result.context("Send failed")?);
    Ok(())
}

async fn receive(address: &str, save_path: PathBuf, config: PeerConfig) -> Result<()> {
    let location = SaveLocation::new(save_path);
    let receiver = match FileReceiver::from_address(address, location, config) {
        Ok(receiver) => receiver,
        Err(PeerError::HttpUnavailable(url)) => {
            anyhow::bail!("{url} looks like an HTTP address; HTTP downloads are not supported")
        }
        Err(e) => return Err(e.into()),
    };

    println!("{} {}", "Receiving".cyan().bold(), receiver.file_id().bold());
    let renderer = render_progress(receiver.progress());
    let result = receiver.run().await;
    renderer.abort();
    report(result.context("Receive failed")?);
    Ok(())
}

/// Redraws one status line whenever the transfer advances.
fn render_progress(mut rx: watch::Receiver<Progress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let p = *rx.borrow_and_update();
            let line = match p.percent() {
                Some(pct) => format!(
                    "{:>6.1}%  {} / {} bytes  {:.2} MiB/s",
                    pct,
                    p.transferred,
                    p.total.unwrap_or_default(),
                    p.throughput_mib_s()
                ),
                None => format!(
                    "{} bytes  {:.2} MiB/s",
                    p.transferred,
                    p.throughput_mib_s()
                ),
            };
            print!("\r{}", line.cyan());
            let _ = std::io::stdout().flush();
        }
    })
}

fn report(summary: TransferSummary) {
    println!();
    println!(
        "{} {} ({} bytes in {:.1?}, {:.2} MiB/s)",
        "Done:".green().bold(),
        summary.file_name,
        summary.bytes,
        summary.elapsed,
        summary.throughput_mib_s()
    );
    if let Some(path) = &summary.path {
        println!("   Saved to {}", path.display());
    }
    if summary.bytes > 0 && summary.path.is_none() && !summary.acknowledged {
        println!("{}", "   The receiver did not confirm the transfer".yellow());
    }
}
