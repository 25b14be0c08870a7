//! Event Desk server - binary entry point
//!
//! Serves the command table on stdio and, when `EVENT_DESK_HTTP_ADDR` is
//! set, the read-only viewer API on a background thread.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use tracing::{error, info};

use event_desk::api::{create_router, ApiState};
use event_desk::commands::register_all_commands;
use event_desk::{logging, AppConfig, CommandServer, EventStore, RequestContext, StoreResult};

fn main() -> StoreResult<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    logging::init(config.log_format);

    let store = Arc::new(EventStore::open(config.store.clone())?);
    let mut ctx = RequestContext::new(config.user.clone());
    if let Some(event) = store.bootstrap(&ctx)? {
        info!(event = %event.id, "created default event");
    }
    if let Some(first) = store.list().into_iter().next() {
        ctx = ctx.with_active_event(first.id);
    }

    if let Err(e) = ctrlc::set_handler(|| {
        info!("interrupted, shutting down");
        std::process::exit(0);
    }) {
        error!(error = %e, "could not install Ctrl+C handler");
    }

    if let Some(addr) = config.http_addr {
        spawn_http(addr, Arc::clone(&store))?;
    }

    info!(data_dir = %config.store.data_dir.display(), user = %ctx.user, "event desk starting");
    let mut server = CommandServer::new(ctx);
    register_all_commands(&mut server, store);
    server.run()
}

fn spawn_http(addr: SocketAddr, store: Arc<EventStore>) -> StoreResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("http-api".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let app = create_router(Arc::new(ApiState::new(store)));
                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!(%addr, error = %e, "could not bind HTTP API");
                        return;
                    }
                };
                info!(%addr, "HTTP API listening");
                if let Err(e) = axum::serve(listener, app).await {
                    error!(error = %e, "HTTP API stopped");
                }
            });
        })?;
    Ok(())
}
