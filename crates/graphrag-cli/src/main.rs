use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use graphrag_cli::{
    cli::Cli,
    commands,
    config::{self, CliOverrides},
    context::Context,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --log-level / --verbose win over RUST_LOG; stdout is reserved for command output
    let env_filter = match cli.log_filter() {
        Some(level) => EnvFilter::default().add_directive(level.into()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(&CliOverrides::from(&cli))?;
    let ctx = Context::from_config(config).await?;

    let format = cli.format;
    let result = commands::dispatch(&ctx, cli.command, format).await;
    if let Err(e) = ctx.close().await {
        debug!("Failed to close store: {}", e);
    }

    println!("{}", result?);
    Ok(())
}
