//! Webmail Login Router
//!
//! HTTP front door for webmail logins built with axum and tokio. Each login is
//! routed to the login page of the provider hosting its domain.

use anyhow::Context;
use axum::Router;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use mailroute_core::{rules::RuleSet, ResolutionPipeline};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api_handler;
mod config;
mod middleware;
mod privacy;
mod routes;

use config::*;
use privacy::PrivacyProcessor;

/// Shared application state
pub struct AppState {
    pub pipeline: Arc<ResolutionPipeline>,
    pub privacy: Arc<PrivacyProcessor>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_config().context("Failed to load configuration")?;

    // Initialize tracing/logging
    init_tracing(&config);

    info!("Starting Webmail Login Router v{}", env!("CARGO_PKG_VERSION"));

    let rules = load_rules(&config.routing)?;
    let pipeline = ResolutionPipeline::new(config.routing.to_router_config(), rules)
        .context("Failed to initialize resolution pipeline")?;

    let pipeline_stats = pipeline.get_stats();
    info!(
        "Pipeline initialized - {} direct rules, {} MX rules, {} probe groups",
        pipeline_stats.direct_rules_count,
        pipeline_stats.mx_rules_count,
        pipeline_stats.probe_groups_count
    );

    let privacy = match &config.privacy.salt {
        Some(salt) => PrivacyProcessor::new(salt.as_bytes().to_vec()),
        None => PrivacyProcessor::with_random_salt(),
    };

    // Create shared application state
    let app_state = AppState {
        pipeline: Arc::new(pipeline),
        privacy: Arc::new(privacy),
    };

    // Build the router
    let app = create_router(app_state);

    // Start the server
    let addr = (config.server.host.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}:{}", addr.0, addr.1))?;
    let local_addr = listener.local_addr()?;

    info!("Server listening on {}", local_addr);
    info!("Health check available at http://{}/health", local_addr);
    info!("Login redirect: http://{}/route?login=", local_addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    routes::build_routes(Arc::new(state))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Load application configuration from environment and files
///
/// Precedence, lowest first: built-in defaults, `Config.toml` in the working
/// directory, then `MAILROUTE_` environment variables with `__` separating
/// sections (`MAILROUTE_SERVER__PORT=8080`).
fn load_config() -> Result<AppConfig, figment::Error> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if std::path::Path::new("Config.toml").exists() {
        figment = figment.merge(Toml::file("Config.toml"));
    }

    figment
        .merge(Env::prefixed("MAILROUTE_").split("__"))
        .extract()
}

/// Load the rule tables, replacing the built-in ones when a rules file is set
fn load_rules(routing: &RoutingConfig) -> anyhow::Result<Arc<RuleSet>> {
    let Some(path) = &routing.rules_file else {
        return Ok(RuleSet::builtin());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file {}", path.display()))?;
    let rules = RuleSet::from_toml_str(&contents)
        .with_context(|| format!("Invalid rules file {}", path.display()))?;

    info!("Loaded rules from {}", path.display());
    Ok(Arc::new(rules))
}

/// Initialize tracing and logging
///
/// `RUST_LOG` wins over the configured log level.
fn init_tracing(config: &AppConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.observability.log_level));

    if config.observability.json_logs {
        // JSON format for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable format for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
