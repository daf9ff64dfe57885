//! Intercore CLI: run a core with a simulated adapter on an in-process bus,
//! serve it over HTTP/JSON-RPC, or drive it with one-shot calls.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use intercore_cli::commands::{self, serve::ServeOptions, Topology};

/// Intercore: RPC over a publish/subscribe message bus
#[derive(Parser)]
#[command(name = "intercore", version, about = "Intercore: RPC over a publish/subscribe message bus")]
pub struct Cli {
    /// Path to a YAML core configuration file
    #[arg(long, env = "INTERCORE_CONFIG")]
    config: Option<String>,

    /// Do not start the simulated adapter
    #[arg(long)]
    no_simulated_adapter: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the core and its HTTP/JSON-RPC front door
    Serve {
        /// Host to bind to
        #[arg(long, env = "INTERCORE_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "INTERCORE_PORT", default_value_t = intercore_server::DEFAULT_PORT)]
        port: u16,
        /// PEM certificate chain; enables TLS together with --tls-key
        #[arg(long, env = "INTERCORE_TLS_CERT")]
        tls_cert: Option<PathBuf>,
        /// PEM private key
        #[arg(long, env = "INTERCORE_TLS_KEY")]
        tls_key: Option<PathBuf>,
    },

    /// Send one JSON-RPC request to an in-process core
    Rpc {
        /// JSON-RPC method name (e.g. "devices.adopt")
        #[arg(long)]
        method: String,
        /// JSON-RPC params as a JSON string
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Print the effective core configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intercore_core=info,intercore_server=info,intercore_cli=info".into()),
        )
        .init();

    let result = run(cli).await;
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = commands::load_config(cli.config.as_deref())?;
    let with_adapter = !cli.no_simulated_adapter;

    match cli.command {
        Commands::Serve {
            host,
            port,
            tls_cert,
            tls_key,
        } => {
            let topology = Topology::start(&config, with_adapter).await?;
            let options = ServeOptions {
                host,
                port,
                tls_cert,
                tls_key,
            };
            commands::serve::run(topology, options).await
        }

        Commands::Rpc { method, params } => {
            let topology = Topology::start(&config, with_adapter).await?;
            let result = commands::rpc::run(&topology.state, &method, &params).await;
            topology.shutdown().await;
            result
        }

        Commands::Config => commands::config::show(&config),
    }
}
