//! message-chess CLI entry point.

use clap::Parser;

use message_chess::cli::{self, commands, Cli, Commands};
use message_chess::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => cli::handle_error(&err, cli.json),
    };

    // Held for the life of the process so buffered file logs are flushed.
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Review(args) => commands::review::execute(args, &config, cli.json).await,
        Commands::Analyze(args) => commands::analyze::execute(args, &config, cli.json).await,
        Commands::Practice(args) => commands::practice::execute(args, &config, cli.json).await,
        Commands::Personas => commands::personas::execute(cli.json),
        Commands::Validate(args) => commands::validate::execute(args, cli.json).await,
        Commands::Cache(args) => commands::cache::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        cli::handle_error(&err, cli.json);
    }
}
