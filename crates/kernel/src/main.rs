//! Inkwell server and operator CLI.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use inkwell_kernel::content::{DocumentMeta, decode_content, render_document, render_fragment};
use inkwell_kernel::models::Role;
use inkwell_kernel::services::AuthService;
use inkwell_kernel::store::Stores;
use inkwell_kernel::{AppState, Config, db, routes, session};

#[derive(Parser)]
#[command(name = "inkwell")]
#[command(version, about = "Inkwell blog backoffice")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Keep all records and sessions in memory instead of PostgreSQL and Redis
        #[arg(long)]
        in_memory: bool,
    },
    /// Apply database migrations
    Migrate,
    /// Manage the signup whitelist
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
    /// Render a persisted content value to HTML
    Render {
        /// File holding the persisted content (JSON, legacy or raw HTML)
        file: PathBuf,
        /// Print a standalone document instead of the fragment
        #[arg(long)]
        document: bool,
        /// Document title
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Subcommand)]
enum WhitelistAction {
    /// Allow an email to sign up
    Add {
        email: String,
        /// Role the account receives on signup
        #[arg(long, default_value = "reader")]
        role: Role,
    },
    /// Remove an email from the whitelist
    Remove { email: String },
    /// List whitelisted emails
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_tracing();

    match cli.command.unwrap_or(Commands::Serve { in_memory: false }) {
        Commands::Serve { in_memory } => serve(in_memory).await,
        Commands::Migrate => migrate().await,
        Commands::Whitelist { action } => whitelist(action).await,
        Commands::Render {
            file,
            document,
            title,
        } => render(&file, document, title),
    }
}

async fn serve(in_memory: bool) -> Result<()> {
    info!("Starting Inkwell");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, in_memory, "Configuration loaded");

    let state = if in_memory {
        AppState::in_memory(&config).await
    } else {
        AppState::new(&config).await
    }
    .context("failed to initialize application state")?;

    let same_site = session::parse_same_site(&config.cookie_same_site);
    let app = if in_memory {
        routes::router().layer(session::memory_session_layer(same_site, config.cookie_secure))
    } else {
        let session_layer =
            session::create_session_layer(&config.redis_url, same_site, config.cookie_secure)
                .await
                .context("failed to create session layer")?;
        routes::router().layer(session_layer)
    };

    let app: Router = app
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn migrate() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;
    info!("Migrations applied");
    Ok(())
}

async fn whitelist(action: WhitelistAction) -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let pool = db::create_pool(&config).await?;
    let stores = Stores::postgres(pool);
    let auth = AuthService::new(stores.users, stores.whitelist);

    match action {
        WhitelistAction::Add { email, role } => {
            let entry = auth.whitelist_add(&email, role).await?;
            println!("{} ({})", entry.email, entry.role);
        }
        WhitelistAction::Remove { email } => {
            if auth.whitelist_remove(&email).await? {
                println!("removed {email}");
            } else {
                warn!(email = %email, "email was not whitelisted");
            }
        }
        WhitelistAction::List => {
            for entry in auth.whitelist_list().await? {
                println!("{}\t{}\t{}", entry.email, entry.role, entry.created.to_rfc3339());
            }
        }
    }

    Ok(())
}

fn render(file: &Path, document: bool, title: Option<String>) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let content = decode_content(&raw).into_structured();

    let html = if document {
        let meta = DocumentMeta {
            title: title.unwrap_or_default(),
            ..DocumentMeta::default()
        };
        render_document(&meta, &content)
    } else {
        render_fragment(&content)
    };

    println!("{html}");
    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_credentials(true)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
