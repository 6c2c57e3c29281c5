//! Process bootstrap for the Blockfall relay.

use blockfall::{BlockfallError, BlockfallServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BlockfallError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let server = BlockfallServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "Blockfall relay listening");
    server.run().await
}
