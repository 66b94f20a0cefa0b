use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use sfc_router::config;
use sfc_router::dpi::signatures::SignatureSet;
use sfc_router::dpi::Dpi;
use sfc_router::http::HttpServer;
use sfc_router::net::identity::{IdentityRole, TlsIdentity};
use sfc_router::net::tls;
use sfc_router::observability::{logging, metrics};
use sfc_router::routing::Forwarder;

#[derive(Parser)]
#[command(name = "sfc-router")]
#[command(about = "Zero-trust service-function chain hop with deep packet inspection")]
struct Args {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config", default_value = "./config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("sfc_router=info,audit=info,tower_http=info");

    let args = Args::parse();
    let config = config::load_config(&args.config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        policy = ?config.dpi.policy,
        "configuration loaded"
    );

    // Both the server and the outbound client build rustls configs; pin
    // the process-wide provider before either does.
    if rustls::crypto::aws_lc_rs::default_provider().install_default().is_err() {
        tracing::debug!("default crypto provider was already installed");
    }

    // Everything below is startup-fatal: the process must not serve with a
    // partially-initialized signature or trust configuration.
    let signatures = SignatureSet::builtin()?;
    let dpi = Arc::new(Dpi::new(signatures, config.dpi.policy));

    let server_identity = TlsIdentity::load(IdentityRole::Server, &config.server_identity)?;
    let client_identity = config
        .client_identity
        .as_ref()
        .map(|c| TlsIdentity::load(IdentityRole::Client, c))
        .transpose()?;
    if client_identity.is_none() {
        tracing::warn!("no client-role identity configured; https next hops will be rejected");
    }

    let tls_config = tls::server_config(&server_identity)?;
    let forwarder = Arc::new(Forwarder::new(&config.forwarder, client_identity.as_ref())?);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config, dpi, forwarder);
    let rustls_config =
        axum_server::tls_rustls::RustlsConfig::from_config(Arc::new(tls_config));
    server.run(rustls_config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
