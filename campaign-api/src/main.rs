use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use campaign_api::{config, handlers, helpers, ingest};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

// Analysis callbacks can carry long summaries
const MAX_WEBHOOK_BODY: usize = 2 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Use this config file instead of the one in the user config directory
    #[arg(long)]
    config: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("campaign-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path.as_deref());

    // Load config
    let loaded = match &args.config {
        Some(path) => config::ApiConfig::load_from(std::path::Path::new(path)),
        None => config::ApiConfig::load(),
    };
    let (config, config_path) = loaded.map_err(|e| {
        tracing::error!("Failed to load config: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
    })?;
    tracing::info!("Config loaded from: {:?}", config_path);

    // Initialize database
    let db = helpers::database::initialize_database(&config).map_err(|e| {
        tracing::error!("Failed to initialize database: {:#}", e);
        std::io::Error::other(format!("{:#}", e))
    })?;
    if let Ok(db_path) = helpers::database::get_db_path(&config) {
        tracing::info!("Database initialized at: {:?}", db_path);
    }

    let webhooks = &config.webhooks;
    tracing::info!(
        acknowledge_on_persistence_error = webhooks.acknowledge_on_persistence_error,
        candidate_outcome_policy = ?webhooks.candidate_outcome_policy,
        record_deliveries = webhooks.record_deliveries,
        delivery_retention_days = webhooks.delivery_retention_days,
        "Call webhook settings"
    );
    let webhook_state = handlers::webhooks::WebhookAppState {
        ingestor: Arc::new(ingest::CallWebhookIngestor::new(
            &db,
            webhooks.candidate_outcome_policy,
            webhooks.record_deliveries,
        )
        .with_retention(webhooks.delivery_retention_days)),
        acknowledge_on_persistence_error: webhooks.acknowledge_on_persistence_error,
    };
    let db_conn = db.connection.clone();

    // Get server config or use defaults
    let (host, configured_port) = config.host_and_port();
    let port = args.port.unwrap_or(configured_port);

    tracing::info!("Starting server on {}:{}", host, port);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        // Configure CORS
        let cors = if let Some(cors_config) = &cors_config {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::PayloadConfig::new(MAX_WEBHOOK_BODY))
            .app_data(web::Data::new(webhook_state.clone()))
            .app_data(web::Data::new(db_conn.clone()))
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
