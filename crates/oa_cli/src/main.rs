use clap::Parser;
use oa_core::{PageFetcher, Result, WorkSource};
use oa_fetch::config::DEFAULT_BASE_URL;
use oa_fetch::logging::init_logging;
use oa_fetch::{handle_command, FetchCommands, HttpPageFetcher, OpenAlexClient, OpenAlexConfig};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Enrich article spreadsheets with OpenAlex metadata", long_about = None)]
pub struct Cli {
    /// Contact address sent with every request for the polite pool
    #[arg(long, global = true, env = "OPENALEX_EMAIL")]
    email: Option<String>,

    #[arg(long, global = true, env = "OPENALEX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Log every lookup
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: FetchCommands,
}

impl Cli {
    fn config(&self) -> OpenAlexConfig {
        OpenAlexConfig::default()
            .with_base_url(&self.base_url)
            .with_email(self.email.clone())
            .with_api_key(self.api_key.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.debug { Level::DEBUG } else { Level::INFO });

    let config = cli.config();
    if config.email.is_none() {
        info!("📭 No contact email set; requests go to the common pool");
    }

    let source: Arc<dyn WorkSource> = Arc::new(OpenAlexClient::new(config.clone())?);
    let pages: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(&config)?);
    info!("🌐 Using {}", config.base_url);

    handle_command(cli.command, source, pages).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "oa-enrich",
            "resolve",
            "https://doi.org/10.1167/jov.20.1.2",
            "--email",
            "lab@example.org",
            "--base-url",
            "http://localhost:8080/",
            "-d",
        ])
        .unwrap();

        assert!(cli.debug);
        let config = cli.config();
        assert_eq!(config.email.as_deref(), Some("lab@example.org"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(matches!(cli.command, FetchCommands::Resolve { ref link, .. } if link.ends_with("jov.20.1.2")));
    }
}
