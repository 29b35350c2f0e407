use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod chart;
mod client;
mod config;
mod controller;
mod error;
mod export;
mod models;
mod query;
mod report;
mod session;
mod transform;
mod transport;

use config::Config;
use controller::{Dashboard, PageController, PageState};
use session::{FileStore, KeyValueStore, SessionStore};
use transport::{HttpTransport, Transport};

#[derive(Parser)]
#[command(name = "progress-dashboard")]
#[command(about = "Learning progress dashboard: XP, projects and skills", long_about = None)]
struct Cli {
    /// Override the session file location
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and write the dashboard page
    Login {
        #[arg(long, short)]
        username: String,
        #[arg(long, short, env = "PROGRESS_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "dashboard.html")]
        out: PathBuf,
    },
    /// Write the dashboard page using the stored session
    Dashboard {
        #[arg(long, default_value = "dashboard.html")]
        out: PathBuf,
    },
    /// Print summary statistics
    Summary,
    /// Export a chart series as CSV
    Export {
        #[arg(long, value_enum)]
        series: export::Series,
        #[arg(long)]
        out: PathBuf,
    },
    /// Clear the stored session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "progress_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    info!(api = %config.api_base, event = config.event_id, "starting");

    let transport = Arc::new(
        HttpTransport::new(config.http_timeout).context("failed to build HTTP client")?,
    );
    let session = SessionStore::new(FileStore::new(&config.session_file));
    let mut controller = PageController::new(session, transport, &config);

    match cli.command {
        Commands::Login {
            username,
            password,
            out,
        } => {
            controller.sign_in(&username, &password).await;
            let dashboard = settle(&mut controller).await?;
            write_page(&dashboard, &out)?;
        }
        Commands::Dashboard { out } => {
            controller.resume().await;
            let dashboard = settle(&mut controller).await?;
            write_page(&dashboard, &out)?;
        }
        Commands::Summary => {
            controller.resume().await;
            let dashboard = settle(&mut controller).await?;
            print!("{}", report::build_summary(&dashboard));
        }
        Commands::Export { series, out } => {
            controller.resume().await;
            let dashboard = settle(&mut controller).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let rows = export::write_series(&dashboard, series, file)?;
            println!("Exported {rows} rows to {}.", out.display());
        }
        Commands::Logout => {
            if let Err(err) = controller.logout() {
                anyhow::bail!("{} ({err})", err.user_message());
            }
            println!("Signed out.");
        }
    }

    Ok(())
}

/// Drives the controller until it is loaded, offering a retry on each error.
async fn settle<S: KeyValueStore, T: Transport>(
    controller: &mut PageController<S, T>,
) -> anyhow::Result<Dashboard> {
    loop {
        match controller.state() {
            PageState::Loaded(dashboard) => return Ok(dashboard.as_ref().clone()),
            PageState::Error { message } => {
                eprintln!("{message}");
                if !prompt_retry()? {
                    anyhow::bail!("dashboard could not be loaded");
                }
                controller.retry().await;
            }
            PageState::LoggedOut { notice } => {
                let reason = notice
                    .clone()
                    .unwrap_or_else(|| "Not signed in.".to_string());
                anyhow::bail!("{reason} Run `progress-dashboard login` to sign in.");
            }
            PageState::Loading => anyhow::bail!("dashboard load did not settle"),
        }
    }
}

fn prompt_retry() -> anyhow::Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    eprint!("Retry? [y/N] ");
    std::io::stderr().flush()?;

    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn write_page(dashboard: &Dashboard, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, report::build_page(dashboard))
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Dashboard for {} written to {}.", dashboard.login, out.display());
    Ok(())
}
