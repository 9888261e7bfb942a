// src/cli.rs
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::backend::{self, LocalBackend};
use crate::board::{JobCard, JobFilter};
use crate::config::{AppConfig, BackendConfig};
use crate::web::start_web_server;

#[derive(Parser)]
#[command(name = "siraaj")]
#[command(about = "Job board API connecting fresh graduates with local employers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Also write JSON logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (the default)
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the tables of the local store
    Migrate,
    /// Print the open jobs, filtered like the job list
    Jobs {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "")]
        location: String,
    },
}

pub async fn handle_command(command: Option<Command>, mut config: AppConfig) -> Result<()> {
    match command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            start_web_server(config).await
        }

        Command::Migrate => match &config.backend {
            BackendConfig::Local { database_path } => {
                LocalBackend::open(database_path, config.token_verifier()).await?;
                info!("Local store ready at {}", database_path.display());
                Ok(())
            }
            BackendConfig::Rest { url, .. } => {
                bail!("The tables of the hosted backend at {} are managed there", url)
            }
        },

        Command::Jobs { search, location } => {
            let verifier = config.token_verifier();
            let backend = backend::connect(&config, &verifier).await?;
            let filter = JobFilter::new(&search, &location);
            let jobs = filter.apply(backend.list_open_jobs().await?);

            if jobs.is_empty() {
                println!("No open jobs match");
            }
            for job in &jobs {
                let card = JobCard::from(job);
                println!(
                    "{}  {}  {}  {}  {}",
                    card.posted_on,
                    card.title,
                    card.company_name.as_deref().unwrap_or("-"),
                    card.location,
                    card.job_type
                );
            }
            Ok(())
        }
    }
}
