//! Estate Portal - command line client
//!
//! Lists, submits and removes leads and support requests, and reads or
//! replaces the landing-page stats, against a running portal API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use estate_client::api::{CredentialStore, FileCredentials, MemoryCredentials, NoCredentials};
use estate_client::models::{CreateLead, CreateSupportRequest, PageParams, StatsSnapshot};
use estate_client::{Api, ClientConfig};

#[derive(Parser)]
#[command(name = "estate-client", about = "Estate Portal API client", version)]
struct Cli {
    /// API base URL (overrides API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (overrides API_TOKEN_FILE)
    #[arg(long, global = true, env = "API_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List leads
    Leads {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// List support requests
    SupportRequests {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Submit a lead for a listing
    CreateLead {
        first_name: String,
        phone_number: String,
        announcement_id: String,
    },
    /// Submit a support request
    CreateSupportRequest {
        first_name: String,
        phone_number: String,
        details: String,
    },
    /// Delete a lead by id
    DeleteLead { id: String },
    /// Delete a support request by id
    DeleteSupportRequest { id: String },
    /// Show the landing-page stats
    Stats,
    /// Replace the landing-page stats
    UpdateStats {
        #[arg(long)]
        apartments_sold_monthly: String,
        #[arg(long)]
        average_price_one_room: String,
        #[arg(long)]
        avg_sale_days: String,
        #[arg(long)]
        news_message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("estate_client=info".parse()?))
        .init();

    // Loads .env as well, so it has to run before clap reads API_TOKEN
    let mut config = ClientConfig::from_env();
    let cli = Cli::parse();

    if let Some(url) = &cli.api_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }

    let credentials: Arc<dyn CredentialStore> = match (&cli.token, &config.token_file) {
        (Some(token), _) => Arc::new(MemoryCredentials::new(Some(token.clone()))),
        (None, Some(path)) => Arc::new(FileCredentials::new(path)),
        (None, None) => Arc::new(NoCredentials),
    };

    tracing::info!("Using portal API at {}", config.base_url);
    let api = Api::new(&config, credentials).context("failed to build API client")?;

    run(&api, cli.command).await
}

async fn run(api: &Api, command: Commands) -> Result<()> {
    match command {
        Commands::Leads { page, page_size } => {
            let page = api
                .leads
                .list(PageParams { page, page_size })
                .settled()
                .await
                .context("failed to list leads")?;
            print_json(&*page)
        }
        Commands::SupportRequests { page, page_size } => {
            let page = api
                .support_requests
                .list(PageParams { page, page_size })
                .settled()
                .await
                .context("failed to list support requests")?;
            print_json(&*page)
        }
        Commands::CreateLead { first_name, phone_number, announcement_id } => {
            let lead = api
                .leads
                .create(&CreateLead { first_name, phone_number, announcement_id })
                .await
                .context("failed to create lead")?;
            print_json(&lead)
        }
        Commands::CreateSupportRequest { first_name, phone_number, details } => {
            let request = api
                .support_requests
                .create(&CreateSupportRequest { first_name, phone_number, details })
                .await
                .context("failed to create support request")?;
            print_json(&request)
        }
        Commands::DeleteLead { id } => {
            let response = api
                .leads
                .delete(&id)
                .await
                .with_context(|| format!("failed to delete lead {}", id))?;
            print_json(&response)
        }
        Commands::DeleteSupportRequest { id } => {
            let response = api
                .support_requests
                .delete(&id)
                .await
                .with_context(|| format!("failed to delete support request {}", id))?;
            print_json(&response)
        }
        Commands::Stats => {
            let stats = api.stats.get().settled().await.context("failed to load stats")?;
            print_json(&*stats)
        }
        Commands::UpdateStats {
            apartments_sold_monthly,
            average_price_one_room,
            avg_sale_days,
            news_message,
        } => {
            let snapshot = StatsSnapshot {
                apartments_sold_monthly,
                average_price_one_room,
                avg_sale_days,
                news_message,
            };
            let updated = api.stats.update(&snapshot).await.context("failed to update stats")?;
            print_json(&updated)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
