//! Traced NATS consumer binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use spanlink::{Consumer, ConsumerConfig, InboundMessage};

#[derive(Parser, Debug)]
#[command(name = "spanlink", version, about = "NATS consumer that links messages into distributed traces")]
struct Args {
    /// Subject to subscribe to
    subject: String,

    /// NATS server URL(s), comma separated
    #[arg(short, long, default_value = spanlink::config::DEFAULT_BROKER_URL)]
    server: String,

    /// OTLP collector endpoint spans are exported to
    #[arg(long, default_value = spanlink::config::DEFAULT_OTLP_ENDPOINT)]
    otlp_endpoint: String,

    /// Service name reported in the trace resource
    #[arg(long, default_value = "spanlink")]
    service_name: String,

    /// NATS credentials file
    #[arg(long)]
    creds: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        tracing::error!(%err, "consumer terminated");
        std::process::exit(err.exit_code());
    }
}

async fn run(args: Args) -> spanlink::Result<()> {
    let mut config = ConsumerConfig::new(args.subject)
        .with_url(args.server)
        .with_otlp_endpoint(args.otlp_endpoint)
        .with_service_name(args.service_name);
    if let Some(creds) = args.creds {
        config = config.with_credentials_file(creds);
    }

    let consumer = Consumer::new(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let handler = Arc::new(|message: InboundMessage| async move {
        tracing::info!(
            subject = %message.subject,
            bytes = message.payload.len(),
            "received message"
        );
        Ok::<(), spanlink::Error>(())
    });

    consumer.run(handler, shutdown_rx).await
}
