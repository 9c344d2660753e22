mod config;
mod db;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use crate::store::{MemoryRoomStore, PgRoomStore, RoomStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env();

    let store: Arc<dyn RoomStore> = match &config.database_url {
        Some(database_url) => {
            let pool = db::init_pool(database_url, config.db_max_connections)
                .await
                .expect("database init failed");
            tracing::info!(max_connections = config.db_max_connections, "postgres room store ready");
            Arc::new(PgRoomStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; rooms are kept in memory only");
            Arc::new(MemoryRoomStore::new())
        }
    };

    let state = state::AppState::new(store, config.persist).with_client_channel_capacity(config.client_channel_capacity);

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "shared-ink listening");
    axum::serve(listener, app).await.expect("server failed");
}
