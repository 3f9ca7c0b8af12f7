#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entry point for the crime dashboard API server.

use std::path::PathBuf;

use clap::Parser;
use crime_dashboard_server::{ServerConfig, interactive, run_server};

#[derive(Parser)]
#[command(
    name = "crime_dashboard_server",
    about = "Montreal crime dashboard API server"
)]
struct Cli {
    /// Address to listen on (overrides `BIND_ADDR`)
    #[arg(long)]
    bind: Option<String>,
    /// Port to listen on (overrides `PORT`)
    #[arg(long)]
    port: Option<u16>,
    /// Incident CSV file (overrides `CRIME_DATA_PATH`)
    #[arg(long)]
    data: Option<PathBuf>,
    /// District boundary `GeoJSON` file (overrides `DISTRICTS_PATH`)
    #[arg(long)]
    districts: Option<PathBuf>,
    /// Prompt for the settings before starting
    #[arg(long)]
    interactive: bool,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.data.is_some() {
            config.data_path = self.data;
        }
        if self.districts.is_some() {
            config.districts_path = self.districts;
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let prompt = cli.interactive;
    let mut config = ServerConfig::from_env();
    cli.apply(&mut config);

    if prompt {
        match interactive::prompt(config) {
            Some(confirmed) => config = confirmed,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    }

    run_server(config).await
}
