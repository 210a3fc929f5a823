use actix_cors::Cors;
use actix_web::{App, HttpServer};
use boreal_api::config::ApiConfig;
use boreal_api::dedupe::IdentityNormalizer;
use boreal_api::handlers::AppServices;
use boreal_api::helpers;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Config file to use instead of the per-user default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `[database].path` from the config file
    #[arg(long)]
    db_path: Option<PathBuf>,
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
                .unwrap_or(std::ffi::OsStr::new("boreal-api.log")),
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
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path.as_deref());

    let (config, config_path) = match &args.config {
        Some(path) => ApiConfig::load_from(path)?,
        None => ApiConfig::load()?,
    };
    tracing::info!("Loaded config from {}", config_path.display());

    let (db, db_path) = helpers::database::initialize_database(&config, args.db_path.clone())?;
    tracing::info!("Database initialized at: {}", db_path.display());

    let normalizer = IdentityNormalizer::from_config(config.alias_domains());
    tracing::info!(
        "Email alias rules: {} configured provider(s) on top of built-ins",
        config.alias_domains().len()
    );

    let services = AppServices::new(db, normalizer);
    let (host, port) = config.bind_address();

    tracing::info!("Server will listen on {}:{}", host, port);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors_builder = if let Some(cors_config) = &cors_config {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
        } else {
            Cors::default().allow_any_origin()
        };
        let cors = cors_builder
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
            .max_age(3600);

        let services = services.clone();
        App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(|cfg| services.configure(cfg))
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await?;
    Ok(())
}
