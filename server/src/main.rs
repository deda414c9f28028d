use actix_cors::Cors;
use actix_web::{App, HttpServer};
use clap::Parser;

use server::config::Config;
use server::handlers;
use server::server::spawn_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let settings = config.connection_settings();
    let srv_tx = spawn_server(config.queue_capacity);

    log::info!("Relay listening on {}", config.bind);
    let allowed_origin = config.allowed_origin.clone();
    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(cors)
            .data(srv_tx.clone())
            .data(settings)
            .configure(handlers::root)
    })
    .bind(&config.bind)?
    .run()
    .await
}
