use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use shopforge::config::Config;
use shopforge::models::product::demo_catalogue;
use shopforge::routes::{self, health};
use shopforge::state::{default_registry, email_dispatcher, AppState, Stores};
use shopforge::store::postgres::PgStore;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    let stores = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .map_err(startup_error)?;
            let store = PgStore::new(pool);
            store.migrate().await.map_err(startup_error)?;
            let seeded = store
                .seed_products(demo_catalogue())
                .await
                .map_err(startup_error)?;
            log::info!("Connected to PostgreSQL, migrations applied, {} products seeded", seeded);
            Stores::postgres(store)
        }
        None => {
            log::warn!("DATABASE_URL not set; using in-memory stores with the demo catalogue");
            Stores::in_memory()
        }
    };

    let mailer = Arc::new(email_dispatcher(&config).map_err(startup_error)?);
    if mailer.is_configured() {
        log::info!("Email providers (in order): {:?}", mailer.provider_names());
    } else {
        log::warn!("No email provider configured; reset codes and contact messages will not be emailed");
    }
    if config.exposes_reset_codes() {
        log::warn!("APP_ENV=development: reset codes are echoed in API responses");
    }

    let registry = Arc::new(default_registry(&config));
    registry
        .clone()
        .spawn_sweeper(Duration::from_secs(config.reset_sweep_interval_secs));

    let state = web::Data::new(AppState::new(&config, stores, mailer, registry));

    log::info!("Starting shopforge server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}
