use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::generator;
use crate::registry::actor::RegistryActor;
use crate::routes;

/// Wires the generator, the registry actor and the router together and
/// serves until the listener fails.
pub async fn create_web_server(config: Config, listener: TcpListener) {
    let generator = generator::from_settings(&config.generator);
    let registry = Arc::new(RegistryActor::spawn(config.game.clone(), generator));

    let router: Router = routes::create_router(&config).with_state(registry);

    match listener.local_addr() {
        Ok(address) => log::info!("Listening on {address}"),
        Err(error) => log::warn!("Could not read the local address. Error: '{error}'."),
    }
    if let Err(error) = axum::serve(listener, router).await {
        log::error!("The web server stopped. Error: '{error}'.");
    }
}
