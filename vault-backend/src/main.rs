use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::sync::mpsc;

mod categories;
mod config;
mod controllers;
mod groups;
mod ingestor;
mod storage;

use categories::{CategoryRegistry, CategoryWriter};
use config::Config;
use groups::GroupManager;
use ingestor::Ingestor;
use storage::Storage;

pub struct AppState {
    pub config: Config,
    pub registry: Arc<CategoryRegistry>,
    pub groups: Arc<GroupManager>,
    pub writer: Arc<CategoryWriter>,
    pub storage: Arc<dyn Storage>,
    pub ingestor: Arc<dyn Ingestor>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!(
        "Initializing {} storage at {}",
        config.storage_type,
        config.vault_path.display()
    );
    let storage = storage::create_storage(&config).expect("Failed to create storage backend");
    if let Err(e) = storage.initialize().await {
        log::error!("Failed to initialize storage: {}", e);
        return Err(std::io::Error::other(e.to_string()));
    }

    let registry = Arc::new(CategoryRegistry::new(config.categories_file()));
    registry.load().await;
    log::info!("Loaded {} categories", registry.len());

    let groups = Arc::new(GroupManager::new(config.groups_file()));
    groups.load().await;
    log::info!("Monitoring {} groups", groups.len());

    let writer = Arc::new(CategoryWriter::new(registry.clone(), storage.clone()));

    let (tx, rx) = mpsc::unbounded_channel();
    let ingestor = ingestor::create_ingestor(&config, tx).expect("Failed to create ingestor");
    if let Err(e) = ingestor.initialize().await {
        log::warn!("Ingestor initialization failed: {}", e);
    }
    ingestor::spawn_ingest_loop(rx, writer.clone(), groups.clone());

    log::info!("Starting server on port {}", port);

    let reg = registry.clone();
    let grp = groups.clone();
    let wrt = writer.clone();
    let stg = storage.clone();
    let ing = ingestor.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                config: config.clone(),
                registry: Arc::clone(&reg),
                groups: Arc::clone(&grp),
                writer: Arc::clone(&wrt),
                storage: Arc::clone(&stg),
                ingestor: Arc::clone(&ing),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::status::config)
            .configure(controllers::categories::config)
            .configure(controllers::groups::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
