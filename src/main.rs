use dotenvy::dotenv;
use storefront_service::config::Config;
use storefront_service::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let state = AppState::with_pool(pool, config.request_timeout);
    build_server(state, &config.host, config.port)?.await?;
    Ok(())
}
