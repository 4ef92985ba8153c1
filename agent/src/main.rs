//! Geo Relay Agent Entry Point

use clap::Parser;
use georelay_agent::cli::{encode, run, settings_url, Cli, Commands};
use georelay_agent::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let _guard = match logging::init() {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("Error: failed to initialize logging: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = run::execute(&args).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Encode(args) => {
            println!("{}", encode::execute(&args));
        }
        Commands::SettingsUrl(args) => match settings_url::execute(&args) {
            Ok(url) => println!("{}", url),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
    }
}
