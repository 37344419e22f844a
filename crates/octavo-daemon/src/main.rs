//! octavo-daemon: the Octavo book-tracking service.
//!
//! Single OS process running a Tokio async runtime. Clients communicate
//! with the daemon via JSON-RPC over Unix socket.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use octavo_daemon::auth::SessionAuthenticator;
use octavo_daemon::config::DaemonConfig;
use octavo_daemon::events::{Event, EventBus};
use octavo_daemon::rpc::RpcServer;
use octavo_daemon::storage::LocalBlobStore;
use octavo_daemon::{unix_now, DaemonState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("octavo=info".parse()?),
        )
        .init();

    info!("Octavo daemon starting");

    // 1. Load config
    let config = DaemonConfig::load()?;
    let data_dir = config.data_dir();

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database
    let db_path = data_dir.join("octavo.db");
    let conn = octavo_db::open(&db_path)?;
    let db = Arc::new(tokio::sync::Mutex::new(conn));

    // 3. Create event bus
    let event_bus = EventBus::new(1000);

    // 4. Create shutdown channel
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    // 5. Build daemon state
    let blob_dir = config.blob_dir();
    let state = Arc::new(DaemonState {
        db: db.clone(),
        config,
        auth: Arc::new(SessionAuthenticator::new(db)),
        blobs: Arc::new(LocalBlobStore::new(blob_dir)),
        event_bus,
        shutdown_tx: shutdown_tx.clone(),
    });

    // 6. Start RPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 7. Emit DaemonStarted event
    state.event_bus.emit(Event {
        event_type: "DaemonStarted".to_string(),
        timestamp: unix_now(),
        payload: serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    });

    // 8. Run the RPC server until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
