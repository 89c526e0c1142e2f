//! bibgraph CLI entry point

use anyhow::Result;
use bibgraph_cli::{
    commands::{Cli, CommandExecutor},
    interactive::start_interactive,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // No arguments: start the interactive session so the store
    // survives across commands.
    if std::env::args().len() == 1 {
        start_interactive().await?;
        return Ok(());
    }

    let cli = Cli::parse();
    let mut executor = CommandExecutor::new()?;
    let result = executor.execute(cli.command).await?;

    if !result.message.is_empty() {
        println!("{}", result.message);
    }
    if result.success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
