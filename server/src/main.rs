use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};
use vecrank_core::EngineConfig;

#[derive(Parser)]
struct Args {
    /// Corpus directory to index at startup
    #[arg(long, default_value = "./docs")]
    corpus: String,
    /// JSON engine config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = EngineConfig::load(args.config.as_deref())?;
    let app: Router = build_app(args.corpus.clone(), config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, corpus = %args.corpus, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
