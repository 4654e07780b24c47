use clap::Parser;
use tracing_subscriber::EnvFilter;
use userdesk::cli::Cli;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Err(e) = userdesk::cli::run(cli).await {
        match std::env::var("USERDESK_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
