use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "userdesk")]
#[command(about = "userdesk - user directory API with bearer-token sessions")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "YAML file overlaid on the environment profile")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overriding configuration")]
        port: Option<u16>,
    },

    #[command(about = "Load and validate configuration, then exit")]
    Check,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            crate::app::serve(config).await
        }
        Commands::Check => check(&config, cli.json),
    }
}

fn check(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    config.validate()?;

    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("environment: {:?}", config.environment);
        println!("listen:      {}", config.bind_address());
        println!(
            "store:       {}",
            if config.database.url.is_some() { "postgres" } else { "memory" }
        );
        println!("token ttl:   {} minutes", config.security.token_ttl_minutes);
        println!(
            "secret:      {}",
            if config.security.token_secret.is_some() { "configured" } else { "development default" }
        );
        println!("configuration OK");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_port_and_global_config() {
        let cli = Cli::parse_from(["userdesk", "serve", "--port", "4000", "--config", "dev.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("dev.yaml")));
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(4000) })));
    }

    #[test]
    fn subcommand_is_optional() {
        let cli = Cli::parse_from(["userdesk"]);
        assert!(cli.command.is_none());
    }
}
