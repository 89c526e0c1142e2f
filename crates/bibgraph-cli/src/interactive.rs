//! Interactive session.
//!
//! The whole point of the interactive mode is that the store persists
//! between commands: load, query, validate and export all hit the same
//! accumulating graph.

use crate::commands::{Cli, CommandExecutor};
use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};

pub struct InteractiveSession {
    executor: CommandExecutor,
}

impl InteractiveSession {
    pub fn new() -> Result<Self> {
        Ok(InteractiveSession {
            executor: CommandExecutor::new()?,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("bibgraph interactive session");
        println!("Type 'help' for available commands, 'quit' to exit");

        loop {
            print!("bibgraph> ");
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match input {
                "quit" | "exit" | "q" => break,
                "help" | "h" => self.show_help(),
                _ => {
                    if let Err(error) = self.execute_line(input).await {
                        eprintln!("Error: {:#}", error);
                    }
                }
            }
        }
        Ok(())
    }

    async fn execute_line(&mut self, input: &str) -> Result<()> {
        let mut argv = vec!["bibgraph".to_string()];
        argv.extend(shell_words::split(input)?);
        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(error) => {
                // clap renders its own usage text
                eprintln!("{}", error);
                return Ok(());
            }
        };
        let result = self.executor.execute(cli.command).await?;
        if !result.message.is_empty() {
            println!("{}", result.message);
        }
        Ok(())
    }

    fn show_help(&self) {
        println!("Available commands:");
        println!("  load <uris>               Fetch a comma-separated URI list (fail-fast)");
        println!("  bulk <url> [--group G]    Paginated bulk import (skips bad records)");
        println!("  file <path>               Ingest an RDF file or zip archive");
        println!("  query <text>              Run a query");
        println!("  canned <which>            all | subjects | predicates | objects");
        println!("  summary                   Store summary counts");
        println!("  validate [--shapes F]     Validate against shapes");
        println!("  serialize <fmt>           ttl | nt | xml | json-ld");
        println!("  export <query> <fmt>      csv | json");
        println!("  marc2bf <path>            Import a MARC file");
        println!("  bf2marc <fmt> <out>       Export the store as MARC");
        println!("  help                      Show this help");
        println!("  quit                      Exit");
        println!();
        println!("Use '<command> --help' for detailed help on each command");
    }
}

/// Start the interactive session with a fresh store.
pub async fn start_interactive() -> Result<()> {
    let mut session = InteractiveSession::new()?;
    session.run().await
}
