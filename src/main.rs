use tracing::info;

use tickertape::TapeError;
use tickertape::config::fetch_config;
use tickertape::store::RealtimeStore;
use tickertape::websocket::{ConnectionManager, WsTransport};

#[tokio::main]
async fn main() -> Result<(), TapeError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;

    let manager = ConnectionManager::new(WsTransport, &app_config.stream);
    let mut store = RealtimeStore::new(manager, &app_config.stream);

    // Log each decoded batch as it arrives.
    store.manager_mut().on_message(|events| {
        info!(count = events.len(), "Received event batch");
        Ok(())
    });
    store.manager_mut().on_connection(|state| {
        info!(?state, "Connection state changed");
        Ok(())
    });

    store.connect().await?;

    let symbols: Vec<String> = std::env::args().skip(1).collect();
    for symbol in &symbols {
        store.subscribe_to_ticker(symbol).await?;
    }
    info!(?symbols, "Subscribed; streaming");

    store.run().await;

    Ok(())
}
