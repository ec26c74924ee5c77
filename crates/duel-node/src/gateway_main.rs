//! duel-gateway-service — the single client-facing entry point. Terminates
//! HTTPS when certificate material is configured; falls back to plaintext
//! HTTP for local development and the docker-compose demo, where a reverse
//! proxy in front handles termination instead.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use duel_core::types::ServiceName;
use duel_gateway::{app, config::GatewayConfig, tls, GatewayState};
use duel_gateway::proxy::Proxy;

#[derive(Parser, Debug)]
#[command(name = "duel-gateway-service", about = "Ingress gateway")]
struct Args {
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    duel_node::telemetry::init_tracing(args.json_logs);
    info!("gateway starting");

    let config = GatewayConfig::from_env()?;
    let state = GatewayState {
        proxy: Proxy::new(config.own_service_key.clone()),
        upstreams: Arc::new(config.upstreams.clone()),
    };
    let router = app(state);

    let addr = duel_core::config::listen_addr(ServiceName::Gateway.as_str(), "0.0.0.0:8443");
    let addr: std::net::SocketAddr = addr.parse()?;

    match tls::load_gateway_tls()? {
        Some(tls_config) => {
            info!(%addr, "gateway ready (HTTPS)");
            let rustls_config = axum_server::tls_rustls::RustlsConfig::from_config(Arc::new(tls_config));
            axum_server::bind_rustls(addr, rustls_config).serve(router.into_make_service()).await?;
        }
        None => {
            tracing::warn!("CERT_DIR not set — serving plaintext HTTP, not suitable for production");
            info!(%addr, "gateway ready (HTTP)");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, router).await?;
        }
    }
    Ok(())
}
