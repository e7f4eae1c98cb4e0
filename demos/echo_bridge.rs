//! # Demo: echo_bridge
//!
//! Loads a block document from a directory and runs the block runtime with a
//! logging sink instead of a real transport.
//!
//! ```bash
//! mkdir -p /tmp/bridge
//! cat > /tmp/bridge/blocks.json <<'EOF'
//! {
//!   "events":   [{"id": "ping", "message": "Ping received."}],
//!   "monitors": [{"id": "uptime", "message": "Uptime changed", "command": "uptime -p", "frequency": "10s"}],
//!   "operations": [{"id": "say", "message": "Say %1", "command": ["echo", "$1"]}]
//! }
//! EOF
//! cargo run --example echo_bridge -- /tmp/bridge
//! # in another terminal:
//! echo '{"hello": "world"}' > /tmp/bridge/pipes/ping
//! ```

use std::sync::Arc;

use unix_bridge::{Config, Dispatcher, LogSink, Registry, RuntimePaths, Supervisor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unix_bridge=debug".into()),
        )
        .init();

    let base_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| ".".to_owned());
    let paths = RuntimePaths::new(base_dir);
    let cfg = Config::default();

    let (dispatcher, worker) = Dispatcher::channel(cfg.dispatch_capacity_clamped());
    let mut registry = Registry::load(&paths, &cfg, dispatcher)?;
    let sources = registry.take_sources();

    for block in registry.service_blocks() {
        println!("block: {} ({:?}): {}", block.id, block.kind, block.message);
    }

    let supervisor = Supervisor::new(cfg);
    supervisor
        .run(sources, worker, Arc::new(LogSink::new()))
        .await?;
    Ok(())
}
