use actix_cors::Cors;
use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use relaynodes::{standard_runtime, GenerationConfig};
use relayruntime::RuntimeConfig;
use relayserver::{configure, rate_limit, AppState, RateLimiter, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting relay server");

    let config = ServerConfig::from_env();
    let runtime = standard_runtime(&RuntimeConfig::from_env(), GenerationConfig::from_env()).await?;
    info!(
        "Runtime initialized with {} agents and {} integrations",
        runtime.coordinator().agents().len(),
        runtime.integrations().list().len()
    );

    if !config.rate_limit {
        info!("Rate limiting disabled");
    }
    let limiter = config.rate_limit.then(RateLimiter::standard);
    let app_state = web::Data::new(AppState::new(runtime, limiter));

    info!("Server starting on http://{}", config.bind_address);

    let frontend_url = config.frontend_url.clone();
    HttpServer::new(move || {
        let cors = match &frontend_url {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .supports_credentials(),
            None => Cors::default().allow_any_origin(),
        }
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(from_fn(rate_limit))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
