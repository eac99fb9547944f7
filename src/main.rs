use std::net::SocketAddr;

use fibbery::config::Config;
use fibbery::metrics;
use fibbery::startup;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    std_logger::Config::logfmt().init();

    metrics::register_metrics();

    let config = Config::get().expect("Failed to read the configuration.");
    let address = SocketAddr::new(
        config
            .application
            .host
            .parse()
            .expect("Failed to parse the application host."),
        config.application.port,
    );
    let listener = TcpListener::bind(address)
        .await
        .expect("Failed to bind the application port.");

    startup::create_web_server(config, listener).await;
}
