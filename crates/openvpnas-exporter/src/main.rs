use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod agent;
mod exporter;
mod metrics;
mod server;

use exporter::Exporter;
use server::{ExporterState, exporter_router};

#[derive(Parser)]
#[command(
    name = "openvpnas_exporter",
    version,
    about = "Prometheus exporter for OpenVPN Access Server"
)]
struct Cli {
    /// Address to listen on for web interface and telemetry
    #[arg(long = "web.listen-address", default_value = "0.0.0.0:9176")]
    listen_address: String,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// Path to the XML-RPC unix domain socket file
    #[arg(
        long = "openvpnas.xmlrpc-path",
        default_value = "/usr/local/openvpn_as/etc/sock/sagent.localroot"
    )]
    xmlrpc_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("openvpnas_exporter=info".parse()?)
        .add_directive("openvpnas_rpc=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    info!(
        "starting openvpnas_exporter version {}",
        env!("CARGO_PKG_VERSION")
    );
    info!("listen address: {}", cli.listen_address);
    info!("telemetry path: {}", cli.telemetry_path);
    info!("xml-rpc socket path: {}", cli.xmlrpc_path.display());

    let state = Arc::new(ExporterState {
        exporter: Exporter::new(cli.xmlrpc_path),
    });
    let app = exporter_router(state, &cli.telemetry_path);

    let listener = tokio::net::TcpListener::bind(&cli.listen_address).await?;
    info!("exporter listening on {}", cli.listen_address);
    axum::serve(listener, app).await?;

    Ok(())
}
