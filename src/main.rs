//! # Helpdesk client CLI (`hdc`)
//!
//! Searches the knowledge base, manages service-desk tickets, and serves the
//! two pages as a server-rendered front end.
//!
//! ## Usage
//!
//! ```bash
//! hdc --config ./config/hdc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hdc search "<query>"` | Search for solutions, optionally open a ticket from one |
//! | `hdc tickets list` | List tickets, newest first |
//! | `hdc tickets show <id>` | Show one ticket with its comments |
//! | `hdc tickets create` | Create a ticket |
//! | `hdc tickets comment <id> "<text>"` | Comment on a ticket |
//! | `hdc serve` | Start the web front end |
//!
//! ## Examples
//!
//! ```bash
//! # Search only the wiki
//! hdc search "printer jam" --source mediawiki
//!
//! # Open an urgent ticket from the second result
//! hdc search "printer jam" --ticket 2 --priority urgent
//!
//! # Point at another backend without a config file
//! hdc --base-url http://desk.local:5000 tickets list
//! ```
//!
//! Log verbosity is controlled with `RUST_LOG` (default `info`); logs go to
//! stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use helpdesk_client::api::{HelpdeskApi, HttpApi};
use helpdesk_client::config::{self, Config};
use helpdesk_client::models::{Priority, Source};
use helpdesk_client::render::TicketDraft;
use helpdesk_client::{search, server, servicedesk};

/// Helpdesk client: knowledge-base search and service-desk tickets.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. If the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "hdc",
    about = "Helpdesk client: search for solutions and manage service-desk tickets",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/hdc.toml")]
    config: PathBuf,

    /// Backend base URL; overrides `[backend].base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the knowledge base.
    ///
    /// Results are printed in backend order. With `--ticket N` a ticket is
    /// created from the N-th printed result and its solution attached.
    Search {
        /// The search query string.
        query: String,

        /// Restrict to a source (`opensearch`, `mediawiki`, `mock`). Repeatable.
        #[arg(long = "source", value_parser = parse_source)]
        sources: Vec<Source>,

        /// Create a ticket from this (1-based) result.
        #[arg(long)]
        ticket: Option<usize>,

        /// Ticket subject (defaults to the standard request subject).
        #[arg(long, default_value = "")]
        subject: String,

        /// Ticket description.
        #[arg(long, default_value = "")]
        description: String,

        /// Ticket priority: low, normal, high, urgent.
        #[arg(long, default_value = "normal", value_parser = parse_priority)]
        priority: Priority,
    },

    /// Manage service-desk tickets.
    Tickets {
        #[command(subcommand)]
        action: TicketAction,
    },

    /// Start the web front end on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum TicketAction {
    /// List all tickets, newest first.
    List,
    /// Show a ticket with its comments.
    Show { id: u64 },
    /// Create a ticket.
    Create {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Defaults to `[ui].default_priority`.
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    /// Add a comment to a ticket.
    Comment { id: u64, text: String },
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    match Priority::from(s) {
        Priority::Other(p) => Err(format!(
            "unknown priority '{}': expected low, normal, high or urgent",
            p
        )),
        p => Ok(p),
    }
}

fn parse_source(s: &str) -> Result<Source, String> {
    match Source::from(s) {
        Source::Unknown(name) => Err(format!(
            "unknown source '{}': expected opensearch, mediawiki or mock",
            name
        )),
        source => Ok(source),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "config file not found, using defaults");
        Config::minimal()
    };

    if let Some(ref url) = cli.base_url {
        cfg.backend.base_url = url.clone();
        config::validate(&cfg)?;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    if let Commands::Serve = cli.command {
        return server::run_server(&cfg).await;
    }

    let api: Arc<dyn HelpdeskApi> = Arc::new(HttpApi::from_config(&cfg)?);

    match cli.command {
        Commands::Search {
            query,
            sources,
            ticket,
            subject,
            description,
            priority,
        } => {
            let draft = TicketDraft {
                subject,
                description,
                priority,
            };
            search::run_search(&cfg, api, &query, sources, ticket, draft).await?;
        }
        Commands::Tickets { action } => match action {
            TicketAction::List => {
                servicedesk::run_list(&cfg, api).await?;
            }
            TicketAction::Show { id } => {
                servicedesk::run_show(&cfg, api, id).await?;
            }
            TicketAction::Create {
                subject,
                description,
                priority,
            } => {
                let draft = TicketDraft {
                    subject,
                    description,
                    priority: priority.unwrap_or_else(|| cfg.ui.default_priority.clone()),
                };
                servicedesk::run_create(&cfg, api, draft).await?;
            }
            TicketAction::Comment { id, text } => {
                servicedesk::run_comment(&cfg, api, id, &text).await?;
            }
        },
        Commands::Serve => {}
    }

    Ok(())
}
