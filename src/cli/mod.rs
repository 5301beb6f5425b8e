pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "keyvault")]
#[command(about = "Keyvault CLI - tokens and key procedures against a Keyvault API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint a development bearer token for a tenant user")]
    Token(commands::token::TokenArgs),

    #[command(about = "Key procedures")]
    Key {
        #[command(subcommand)]
        cmd: commands::key::KeyCommands,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Token(args) => commands::token::handle(args),
        Commands::Key { cmd } => commands::key::handle(cmd).await,
    }
}
