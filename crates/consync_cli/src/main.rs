//! Command-line client for Kubernetes-style collection APIs.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use consync_client::{spawn_sync, ApiClient, SyncEvent, SyncOptions};
use consync_core::config::ClientConfig;
use consync_core::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use consync_core::filter::{KeywordFilter, LabelSelector};
use consync_core::models::{ResourceObject, ResourceRef};
use consync_core::session::FetchSession;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "consync", about = "Console client for custom resource collections", version)]
struct Cli {
    /// Server URL (can also be set via CONSYNC_SERVER env var)
    #[arg(short, long, env = "CONSYNC_SERVER")]
    server: Option<String>,

    /// Namespace scope (can also be set via CONSYNC_NAMESPACE env var)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a collection, paginating until exhaustion
    List {
        /// Resource reference as group/version/plural
        resource: String,
        /// Server-side label selector, e.g. "state=failed"
        #[arg(long)]
        selector: Option<String>,
        /// Client-side keyword filter (space-separated tokens)
        #[arg(short, long)]
        keyword: Option<String>,
        /// Page size
        #[arg(short, long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: usize,
    },
    /// Fetch a single object by name
    Get {
        /// Resource reference as group/version/plural
        resource: String,
        name: String,
    },
    /// Delete an object by name
    Delete {
        /// Resource reference as group/version/plural
        resource: String,
        name: String,
    },
    /// Keep a collection synchronized, printing a line per update
    Watch {
        /// Resource reference as group/version/plural
        resource: String,
        /// Server-side label selector, e.g. "state=failed"
        #[arg(long)]
        selector: Option<String>,
        /// Client-side keyword filter (space-separated tokens)
        #[arg(short, long)]
        keyword: Option<String>,
        /// Refresh interval in milliseconds
        #[arg(long, default_value = "10000")]
        interval_ms: u64,
    },
}

fn normalized_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

fn format_age(created: Option<DateTime<Utc>>) -> String {
    let Some(created) = created else {
        return "-".to_string();
    };
    let elapsed = Utc::now().signed_duration_since(created);
    let secs = elapsed.num_seconds().max(0);
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

fn print_table(items: &[ResourceObject]) {
    println!("{:<40} {:<20} {:<8}", "NAME", "NAMESPACE", "AGE");
    for item in items {
        println!(
            "{:<40} {:<20} {:<8}",
            item.metadata.name,
            item.metadata.namespace.as_deref().unwrap_or("-"),
            format_age(item.metadata.creation_timestamp),
        );
    }
}

fn parse_selector(selector: Option<&str>) -> anyhow::Result<Option<LabelSelector>> {
    match selector {
        Some(raw) => Ok(Some(
            LabelSelector::parse(raw).context("invalid --selector")?,
        )),
        None => Ok(None),
    }
}

async fn list_all(
    client: &ApiClient,
    resource: &ResourceRef,
    namespace: Option<&str>,
    selector: Option<&LabelSelector>,
    keyword: Option<&str>,
    limit: usize,
) -> anyhow::Result<Vec<ResourceObject>> {
    let filter = keyword
        .and_then(KeywordFilter::parse)
        .map(KeywordFilter::into_predicate);
    let mut session = FetchSession::start(filter, limit, None);
    // The deadline is never awaited here; one full pass and done.
    let refresh = Duration::from_millis(60_000);
    while let Some(request) = session.begin_page() {
        let page = client
            .list(
                resource,
                namespace,
                selector,
                request.limit,
                request.cursor.as_deref(),
            )
            .await?;
        session.page_received(page.items, page.metadata.continue_token, refresh);
        if session.finished() {
            break;
        }
    }
    Ok(session.filtered_items().to_vec())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(server) = cli.server {
        config.server_url = server.trim_end_matches('/').to_string();
    }
    if let Some(namespace) = cli.namespace {
        config.namespace = Some(namespace);
    }
    config.request_timeout_secs = cli.timeout;

    let client = ApiClient::from_config(&config)?;
    let namespace = config.namespace.as_deref();

    match cli.command {
        Commands::List {
            resource,
            selector,
            keyword,
            limit,
        } => {
            let resource = ResourceRef::parse(&resource)?;
            let selector = parse_selector(selector.as_deref())?;
            let items = list_all(
                &client,
                &resource,
                namespace,
                selector.as_ref(),
                keyword.as_deref(),
                normalized_limit(limit),
            )
            .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_table(&items);
            }
        }
        Commands::Get { resource, name } => {
            let resource = ResourceRef::parse(&resource)?;
            match client.get(&resource, namespace, &name).await? {
                Some(item) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&item)?);
                    } else {
                        print_table(std::slice::from_ref(&item));
                    }
                }
                None => {
                    eprintln!("{} not found", name);
                    std::process::exit(1);
                }
            }
        }
        Commands::Delete { resource, name } => {
            let resource = ResourceRef::parse(&resource)?;
            if client.delete(&resource, namespace, &name).await? {
                println!("deleted {}", name);
            } else {
                eprintln!("{} not found", name);
                std::process::exit(1);
            }
        }
        Commands::Watch {
            resource,
            selector,
            keyword,
            interval_ms,
        } => {
            let resource = ResourceRef::parse(&resource)?;
            let mut options = SyncOptions::new(resource);
            options.namespace = namespace.map(str::to_string);
            options.selector = parse_selector(selector.as_deref())?;
            options.filter = keyword
                .as_deref()
                .and_then(KeywordFilter::parse)
                .map(KeywordFilter::into_predicate);
            options.refresh_interval = Duration::from_millis(interval_ms);

            let mut handle = spawn_sync(client, options);
            loop {
                tokio::select! {
                    event = handle.events.recv() => match event {
                        Some(SyncEvent::Snapshot(snapshot)) => {
                            println!(
                                "{} synced {} items ({} after filter){}",
                                Utc::now().format("%H:%M:%S"),
                                snapshot.items.len(),
                                snapshot.filtered.len(),
                                if snapshot.refreshing { " [refreshing]" } else { "" },
                            );
                        }
                        Some(SyncEvent::PageError(err)) => {
                            eprintln!("page fetch failed: {}", err);
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        break;
                    }
                }
            }
            handle.shutdown().await;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn limit_is_clamped_to_supported_range() {
        assert_eq!(normalized_limit(0), 1);
        assert_eq!(normalized_limit(50), 50);
        assert_eq!(normalized_limit(10_000), MAX_PAGE_LIMIT);
    }

    #[test]
    fn age_formatting_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(None), "-");
        assert_eq!(format_age(Some(now - ChronoDuration::seconds(30))), "30s");
        assert_eq!(format_age(Some(now - ChronoDuration::minutes(5))), "5m");
        assert_eq!(format_age(Some(now - ChronoDuration::hours(7))), "7h");
        assert_eq!(format_age(Some(now - ChronoDuration::days(3))), "3d");
    }
}
