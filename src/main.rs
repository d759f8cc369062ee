use groundrag::infrastructure::{AppConfig, AppContainer};
use groundrag::presentation::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = ?config.database.backend,
        workers = config.server.worker_count,
        "Starting groundrag"
    );

    let container = AppContainer::new(config).await?;
    HttpServer::new(&container).run().await
}
