//! `intercore serve`: the core and its front door, until Ctrl+C.

use std::path::PathBuf;

use intercore_server::{ApiServer, ServerConfig, TlsConfig};

use super::Topology;

pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl ServeOptions {
    pub fn server_config(&self) -> Result<ServerConfig, String> {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_file), Some(key_file)) => Some(TlsConfig {
                cert_file: cert_file.clone(),
                key_file: key_file.clone(),
            }),
            (None, None) => None,
            _ => return Err("--tls-cert and --tls-key must be given together".to_string()),
        };
        Ok(ServerConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
        })
    }
}

pub async fn run(topology: Topology, options: ServeOptions) -> Result<(), String> {
    let config = options.server_config()?;
    let scheme = if config.tls.is_some() { "https" } else { "http" };

    let mut server = ApiServer::new(config, topology.state.clone());
    let addr = server.start().await.map_err(|e| e.to_string())?;
    println!("Intercore listening on {}://{}", scheme, addr);
    println!("  core topic: {}", topology.core.default_topic());
    if topology.adapter.is_some() {
        println!("  simulated adapter: {}", super::simulated::ADAPTER_TYPE);
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    server.stop().await;
    topology.shutdown().await;
    Ok(())
}
