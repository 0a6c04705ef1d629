//! SecondBrain - Personal Knowledge Capture with AI Enrichment
//!
//! `serve` runs the proxy functions and the local items API; the other
//! commands drive the client controllers from the terminal.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use secondbrain::{
    ai::{AiState, ChatResponder, Enricher, HttpGateway},
    api::build_app,
    client::{CaptureForm, ChatAssistant, FunctionsClient, ItemCard, KnowledgeClient, Notice},
    config::{resolve_secret, SecondBrainConfig, StoreBackend},
    knowledge::{ItemQuery, ItemType, KnowledgeItem, SortOrder, TypeFilter},
    store::{
        Authenticator, ItemsApiStore, ItemsState, KnowledgeStore, MemoryStore, RestAuth,
        RestStore, Session, StaticTokens,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "secondbrain")]
#[command(version)]
#[command(about = "Personal knowledge capture with AI summaries and chat")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SECONDBRAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (proxy functions + items API)
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// List knowledge items
    Items {
        /// Case-insensitive search over title, content and tags
        #[arg(short, long, default_value = "")]
        search: String,

        /// all, note, link, insight or article
        #[arg(short = 't', long = "type", default_value = "all")]
        item_type: TypeFilter,

        /// Only favorites
        #[arg(short, long)]
        favorites: bool,

        /// newest, oldest or title
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
    },

    /// Capture a new knowledge item
    Capture {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        content: String,

        #[arg(long, default_value = "")]
        url: String,

        #[arg(short = 't', long = "type", default_value = "note")]
        item_type: ItemType,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// Generate an AI summary and tags for an item
    Enrich { id: String },

    /// Toggle an item's favorite flag
    Favorite { id: String },

    /// Delete an item
    Delete { id: String },

    /// Chat with the assistant about your knowledge
    Chat,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("secondbrain={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SecondBrainConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            run_server(&config, &host, port).await?;
        }
        Commands::Items {
            search,
            item_type,
            favorites,
            sort,
        } => {
            let query = ItemQuery::new()
                .search(search)
                .item_type(item_type)
                .favorites_only(favorites)
                .sort(sort);
            list_items(&config, &query).await?;
        }
        Commands::Capture {
            title,
            content,
            url,
            item_type,
            tags,
        } => {
            let form = CaptureForm {
                title,
                content,
                url,
                item_type,
                tags,
            };
            capture(&config, form).await?;
        }
        Commands::Enrich { id } => {
            let (client, functions) = connect(&config).await?;
            let card = card_for(&client, functions, &id).await?;
            match card.enrich().await {
                Some(notice) => report(&notice)?,
                None => println!("Item '{}' already has an AI summary", id),
            }
        }
        Commands::Favorite { id } => {
            let (client, functions) = connect(&config).await?;
            let card = card_for(&client, functions, &id).await?;
            report(&card.toggle_favorite().await)?;
        }
        Commands::Delete { id } => {
            let (client, functions) = connect(&config).await?;
            let card = card_for(&client, functions, &id).await?;
            report(&card.delete().await)?;
        }
        Commands::Chat => {
            run_chat(&config).await?;
        }
        Commands::Config { default } => {
            let shown = if default {
                SecondBrainConfig::default()
            } else {
                config
            };
            println!("{}", shown.to_toml()?);
        }
    }

    Ok(())
}

// =============================================================================
// Backends
// =============================================================================

type Backend = (Arc<dyn KnowledgeStore>, Arc<dyn Authenticator>);

fn rest_backend(config: &SecondBrainConfig) -> Result<Backend> {
    let store = &config.store;
    if store.url.is_empty() {
        bail!("store.url must be set for the rest backend");
    }
    let anon_key = resolve_secret(&store.anon_key_ref)
        .ok_or_else(|| anyhow!("{} not configured", store.anon_key_ref))?;
    let service_key = resolve_secret(&store.service_key_ref);
    if service_key.is_none() {
        tracing::warn!(
            "{} not configured; chat will answer without knowledge context",
            store.service_key_ref
        );
    }

    Ok((
        Arc::new(RestStore::new(
            store.url.clone(),
            store.table.clone(),
            anon_key.clone(),
            service_key,
        )),
        Arc::new(RestAuth::new(store.url.clone(), anon_key)),
    ))
}

/// Store and authenticator the server answers with
fn server_backend(config: &SecondBrainConfig) -> Result<Backend> {
    match config.store.backend {
        StoreBackend::Memory => Ok((
            Arc::new(MemoryStore::new()),
            Arc::new(StaticTokens::new(config.store.local_tokens.clone())),
        )),
        StoreBackend::Rest => rest_backend(config),
    }
}

/// Store and authenticator the CLI commands use. With the memory backend
/// the items live in a running server, reached through its items API.
fn client_backend(config: &SecondBrainConfig) -> Result<Backend> {
    match config.store.backend {
        StoreBackend::Memory => Ok((
            Arc::new(ItemsApiStore::new(config.client.functions_url.clone())),
            Arc::new(StaticTokens::new(config.store.local_tokens.clone())),
        )),
        StoreBackend::Rest => rest_backend(config),
    }
}

/// Signed-in repository plus the AI function client
async fn connect(
    config: &SecondBrainConfig,
) -> Result<(Arc<KnowledgeClient>, Arc<FunctionsClient>)> {
    let (store, auth) = client_backend(config)?;
    let token = config
        .client
        .access_token
        .clone()
        .context("client.access_token is not configured")?;

    let user_id = match &config.client.user_id {
        Some(id) => id.clone(),
        None => auth
            .resolve(&token)
            .await?
            .context("client.access_token does not belong to any user")?,
    };
    tracing::debug!(user_id = %user_id, backend = store.name(), "Connected");

    let functions = Arc::new(FunctionsClient::new(
        config.client.functions_url.clone(),
        Some(token.clone()),
    ));
    let client = Arc::new(KnowledgeClient::with_session(
        store,
        Session::new(user_id, token),
    ));
    Ok((client, functions))
}

async fn card_for(
    client: &Arc<KnowledgeClient>,
    functions: Arc<FunctionsClient>,
    id: &str,
) -> Result<ItemCard> {
    let items = client.items().await?.unwrap_or_default();
    let item = items
        .iter()
        .find(|i| i.id == id)
        .cloned()
        .ok_or_else(|| anyhow!("Item '{}' not found", id))?;
    Ok(ItemCard::new(item, client.clone(), functions))
}

// =============================================================================
// Commands
// =============================================================================

async fn run_server(config: &SecondBrainConfig, host: &str, port: u16) -> Result<()> {
    tracing::info!("Starting SecondBrain server");

    let (store, auth) = server_backend(config)?;
    tracing::info!(backend = store.name(), "Knowledge store ready");

    let api_key = resolve_secret(&config.gateway.api_key_ref);
    if api_key.is_none() {
        tracing::warn!("{} not configured; AI calls will fail", config.gateway.api_key_ref);
    }
    let gateway = Arc::new(HttpGateway::new(
        config.gateway.base_url.clone(),
        config.gateway.api_key_ref.clone(),
        api_key,
    ));

    let ai_state = AiState {
        enricher: Arc::new(Enricher::new(gateway.clone(), config.gateway.model.clone())),
        chat: Arc::new(ChatResponder::new(
            gateway,
            store.clone(),
            auth.clone(),
            config.gateway.model.clone(),
            config.chat.clone(),
        )),
    };
    let app = build_app(
        ItemsState { store, auth },
        ai_state,
        &config.server.cors_origins,
    );

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    tracing::info!(
        "SecondBrain is listening on http://{}. Press Ctrl+C to stop.",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            // Wait for shutdown signal
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn list_items(config: &SecondBrainConfig, query: &ItemQuery) -> Result<()> {
    let (client, _) = connect(config).await?;
    let items = client.query(query).await?.unwrap_or_default();
    if items.is_empty() {
        println!("{}", client.empty_listing().await?);
        return Ok(());
    }
    for item in &items {
        print_item(item);
    }
    Ok(())
}

fn print_item(item: &KnowledgeItem) {
    println!(
        "{} {} [{}] {}  ({})",
        if item.is_favorite { "★" } else { " " },
        item.id,
        item.item_type,
        item.title,
        item.created_at.format("%b %-d, %Y")
    );
    if let Some(summary) = &item.ai_summary {
        println!("    {}", summary);
    }
    let tags: Vec<&str> = item.all_tags().map(String::as_str).collect();
    if !tags.is_empty() {
        println!("    #{}", tags.join(" #"));
    }
}

async fn capture(config: &SecondBrainConfig, mut form: CaptureForm) -> Result<()> {
    if !form.can_submit() {
        bail!("Title is required");
    }
    let (client, _) = connect(config).await?;
    if let Some(notice) = form.submit(&client).await {
        report(&notice)?;
    }
    Ok(())
}

fn report(notice: &Notice) -> Result<()> {
    if notice.is_error() {
        bail!("{}", notice);
    }
    println!("{}", notice);
    Ok(())
}

async fn run_chat(config: &SecondBrainConfig) -> Result<()> {
    let (_, functions) = connect(config).await?;
    let mut assistant = ChatAssistant::new(functions);

    println!("Ask about your knowledge. Empty line or Ctrl+D to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            break;
        }
        assistant.set_input(line);
        if assistant.submit().await {
            if let Some(reply) = assistant.transcript().last() {
                println!("\n{}\n", reply.content);
            }
        }
    }
    Ok(())
}
