pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "tenant-portal operations: serve, migrate, seed and inspect the database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Insert the sample tenant if it does not exist")]
    Seed,

    #[command(about = "Show row counts for every table")]
    Status,

    #[command(about = "Delete test tenants and everything that belongs to them")]
    CleanTestData {
        #[arg(long, default_value = commands::database::TEST_SLUG_PREFIX, help = "Slug prefix of tenants to delete")]
        prefix: String,
    },

    #[command(about = "Delete all tenants, memberships, invoices and non super-admin profiles")]
    Reset {
        #[arg(long, help = "Confirm the reset")]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::Migrate => commands::database::migrate(&config, output_format).await,
        Commands::Seed => commands::database::seed(&config, output_format).await,
        Commands::Status => commands::database::status(&config, output_format).await,
        Commands::CleanTestData { prefix } => {
            commands::database::clean_test_data(&config, &prefix, output_format).await
        }
        Commands::Reset { yes } => commands::database::reset(&config, yes, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_format() {
        let cli = Cli::try_parse_from(["portal", "--json", "clean-test-data"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        match cli.command {
            Commands::CleanTestData { prefix } => assert_eq!(prefix, "test-"),
            _ => panic!("expected clean-test-data"),
        }

        let cli = Cli::try_parse_from(["portal", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Text);

        let cli = Cli::try_parse_from(["portal", "reset"]).unwrap();
        assert!(matches!(cli.command, Commands::Reset { yes: false }));
        let cli = Cli::try_parse_from(["portal", "reset", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Reset { yes: true }));
    }
}
