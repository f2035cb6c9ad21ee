use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use shoutbin::config::Config;
use shoutbin::handlers;
use shoutbin::storage::postgres::PgStorage;
use shoutbin::storage::Storage;
use shoutbin::sweeper;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = Config::from_env();

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .build(manager)
        .expect("failed to create a pg pool");

    let mut connection = pool.get().expect("failed to reach the database");
    connection
        .run_pending_migrations(MIGRATIONS)
        .expect("failed to run migrations");
    drop(connection);

    let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(pool));

    let sweep_storage = Arc::clone(&storage);
    let sweep_interval = config.sweep_interval;
    std::thread::spawn(move || sweeper::sweep_loop(sweep_storage, sweep_interval));

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(30)
        .finish()
        .expect("invalid rate limit configuration");

    let storage_data = web::Data::from(storage);
    log::info!("shoutbin listening on port {}", config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(storage_data.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Governor::new(&governor_conf))
            .wrap(Logger::default())
            .configure(handlers::routes)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
