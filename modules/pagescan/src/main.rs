use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use graph_client::{
    AlertSink, GraphClient, HttpTransport, JsonFileStore, LogAlertSink, SnapshotStore,
};
use mail_alert::{MailAlertOptions, MailAlertService, ALERT_SUBJECT};
use pagescan::{Config, MailAlertSink};

#[derive(Parser)]
#[command(name = "pagescan")]
#[command(about = "Snapshot Facebook page videos and Instagram media metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch accounts and their posts, then write a snapshot
    Scan {
        /// Pages to follow after the first one (defaults to PAGESCAN_PAGE_BUDGET)
        #[arg(long)]
        pages: Option<u32>,

        /// Do not fetch page videos
        #[arg(long)]
        skip_videos: bool,

        /// Do not fetch Instagram media
        #[arg(long)]
        skip_stories: bool,

        /// Snapshot output path (defaults to PAGESCAN_SNAPSHOT_PATH)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the contents of a saved snapshot
    Show {
        /// Snapshot path (defaults to PAGESCAN_SNAPSHOT_PATH)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pagescan=info".parse()?)
                .add_directive("graph_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            pages,
            skip_videos,
            skip_stories,
            out,
        } => {
            let config = Config::from_env()?;
            config.log_redacted();
            scan(&config, pages, skip_videos, skip_stories, out).await
        }
        Commands::Show { path } => {
            let config = Config::snapshot_from_env()?;
            show(path.unwrap_or(config.snapshot_path)).await
        }
    }
}

async fn scan(
    config: &Config,
    pages: Option<u32>,
    skip_videos: bool,
    skip_stories: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let transport = Arc::new(HttpTransport::with_timeout(Duration::from_secs(
        config.http_timeout_secs,
    ))?);

    let alerts: Arc<dyn AlertSink> = match &config.smtp {
        Some(smtp) => Arc::new(MailAlertSink::new(MailAlertService::new(MailAlertOptions {
            smtp_host: smtp.host.clone(),
            smtp_port: smtp.port,
            username: smtp.username.clone(),
            password: smtp.password.clone(),
            from_name: ALERT_SUBJECT.to_string(),
            from_address: smtp.from_address.clone(),
        }))),
        None => Arc::new(LogAlertSink),
    };

    let mut client = GraphClient::new(config.graph_client_config(), transport, alerts);
    let page_budget = pages.unwrap_or(config.page_budget);

    let accounts = client.fetch_accounts().await?;
    info!(accounts = accounts.len(), "Account directory loaded");

    if !skip_videos {
        client.fetch_video_posts(page_budget).await?;
    }
    if !skip_stories {
        client.fetch_story_posts(page_budget).await?;
    }

    let snapshot = client.snapshot();
    let store = JsonFileStore::new(out.unwrap_or_else(|| config.snapshot_path.clone()));
    store.save(&snapshot).await?;

    let posts: usize = snapshot.data.iter().map(|a| a.posts.len()).sum();
    let ig_posts: usize = snapshot.data.iter().map(|a| a.ig_posts.len()).sum();
    info!(
        scan_time = snapshot.scan_time.as_str(),
        accounts = snapshot.data.len(),
        posts,
        ig_posts,
        path = %store.path().display(),
        "Scan complete"
    );

    Ok(())
}

async fn show(path: PathBuf) -> Result<()> {
    let snapshot = JsonFileStore::new(path).load().await?;

    println!("=== Snapshot {} ===", snapshot.scan_time);
    for account in snapshot.accounts() {
        println!("\n{account}");
        println!("  videos ({}):", account.posts.len());
        for post in &account.posts {
            println!("    {post}");
        }
        println!("  instagram media ({}):", account.ig_posts.len());
        for story in &account.ig_posts {
            println!("    {story}");
        }
    }

    Ok(())
}
