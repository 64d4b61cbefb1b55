//! Gatehouse administrative CLI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use gatehouse_admin::clone::ClientCollection;
use gatehouse_admin::{
    AdminContext, AdminError, ClientService, ClonePolicy, PersistedGrantService, TracingAuditSink,
};
use gatehouse_core::config::AppConfig;
use gatehouse_metadata::MetadataStore;
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Administrative CLI for Gatehouse configuration data
#[derive(Parser, Debug)]
#[command(name = "gatehousectl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "GATEHOUSE_CONFIG",
        default_value = "config/gatehouse.toml"
    )]
    config: String,

    /// Actor recorded in audit events (defaults to admin.default_actor)
    #[arg(long, env = "GATEHOUSE_ACTOR")]
    actor: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the database schema
    Migrate,
    /// Check database connectivity
    Health,
    /// Manage clients
    Client {
        #[command(subcommand)]
        command: ClientCommand,
    },
    /// Inspect and revoke persisted grants
    Grants {
        #[command(subcommand)]
        command: GrantCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// List clients
    List {
        /// Substring of the client id or name; `*` is a wildcard
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
        /// Page size (0 = configured default)
        #[arg(long, default_value_t = 0)]
        page_size: u32,
    },
    /// Show one client
    Get { id: i64 },
    /// Copy a client under a new client id
    Clone {
        source_id: i64,
        client_id: String,
        /// Copy secrets too
        #[arg(long, default_value_t = false)]
        include_secrets: bool,
        /// Display name of the copy
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Delete a client and everything it owns
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum GrantCommand {
    /// List grants by subject
    List {
        /// Exact subject id
        #[arg(long, conflicts_with = "search")]
        subject: Option<String>,
        /// Subject search; `*` is a wildcard
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 0)]
        page_size: u32,
    },
    /// Delete one grant by key
    Delete { key: String },
    /// Delete every grant of a subject
    Purge { subject: String },
}

#[derive(Serialize)]
struct Created {
    id: i64,
}

#[derive(Serialize)]
struct Removed {
    removed: u64,
}

#[derive(Serialize)]
struct Status {
    status: &'static str,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    if std::path::Path::new(path).exists() {
        tracing::debug!(config_path = %path, "loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("no config file found at {path}, using defaults");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("GATEHOUSE_").split("__"))
        .extract()
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run(cli: Cli, store: Arc<dyn MetadataStore>, config: &AppConfig) -> Result<()> {
    let mut ctx = AdminContext::from_config(store.clone(), Arc::new(TracingAuditSink), config);
    if let Some(actor) = &cli.actor {
        ctx = ctx.with_actor(actor.as_str());
    }

    match cli.command {
        Command::Migrate => {
            store.migrate().await.context("migration failed")?;
            print_json(&Status { status: "migrated" })
        }
        Command::Health => {
            store.health_check().await.context("health check failed")?;
            print_json(&Status { status: "ok" })
        }
        Command::Client { command } => {
            let clients = ClientService::new(ctx.clone());
            match command {
                ClientCommand::List {
                    search,
                    page,
                    page_size,
                } => print_json(&clients.get_clients(&search, ctx.page(page, page_size)).await?),
                ClientCommand::Get { id } => print_json(&clients.get_client(id).await?),
                ClientCommand::Clone {
                    source_id,
                    client_id,
                    include_secrets,
                    display_name,
                } => {
                    let mut policy: ClonePolicy<ClientCollection> = ctx.clone_policy();
                    if include_secrets {
                        policy = policy.include(ClientCollection::Secrets);
                    }
                    if let Some(name) = display_name {
                        policy = policy.with_display_name(name);
                    }
                    let id = clients
                        .clone_client_with(source_id, &client_id, &policy)
                        .await?;
                    print_json(&Created { id })
                }
                ClientCommand::Delete { id } => {
                    clients.delete_client(id).await?;
                    print_json(&Status { status: "deleted" })
                }
            }
        }
        Command::Grants { command } => {
            let grants = PersistedGrantService::new(ctx.clone());
            match command {
                GrantCommand::List {
                    subject,
                    search,
                    page,
                    page_size,
                } => {
                    let page = ctx.page(page, page_size);
                    let list = match subject {
                        Some(subject) => grants.get_persisted_grants_by_subject(&subject, page).await?,
                        None => grants.get_persisted_grants_by_subjects(&search, page).await?,
                    };
                    print_json(&list)
                }
                GrantCommand::Delete { key } => {
                    let removed = grants.delete_persisted_grant(&key).await?;
                    print_json(&Removed { removed })
                }
                GrantCommand::Purge { subject } => {
                    let removed = grants.delete_persisted_grants_by_subject(&subject).await?;
                    print_json(&Removed { removed })
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON output.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli.config)?;
    let store = gatehouse_metadata::from_config(&config.metadata)
        .await
        .context("failed to open metadata store")?;

    if let Err(err) = run(cli, store, &config).await {
        if let Some(admin) = err.downcast_ref::<AdminError>() {
            eprintln!("{}", serde_json::to_string(&admin.report())?);
            std::process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}
