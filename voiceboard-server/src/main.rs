//! Voiceboard Server

mod args;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::Args;
use voiceboard_server::chat::ChatRegistry;
use voiceboard_server::constants::*;
use voiceboard_server::db::{MessageDb, init_db};
use voiceboard_server::server::serve;
use voiceboard_server::state::ServerState;
use voiceboard_server::storage::{AudioStore, default_audio_root};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.debug);
    info!("{}{}", MSG_BANNER, env!("CARGO_PKG_VERSION"));

    let store = setup_audio_store(args.audio_root).await;
    let chat = setup_registry(args.database).await;
    let state = ServerState::new(chat, store)
        .with_max_frame_size(args.max_frame_size)
        .with_frame_timeout(Duration::from_secs(args.frame_timeout));

    let (main_listener, notify_listener) =
        setup_network(args.bind, args.port, args.notify_port).await;

    tokio::select! {
        _ = setup_shutdown_signal() => {
            info!("{}", MSG_SHUTDOWN_RECEIVED);
        }
        _ = serve(main_listener, notify_listener, state) => {}
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides `--debug`
fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve and create the recording directory
async fn setup_audio_store(audio_root: Option<PathBuf>) -> AudioStore {
    let root = audio_root.unwrap_or_else(|| match default_audio_root() {
        Ok(path) => path,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    });

    match AudioStore::open(&root).await {
        Ok(store) => {
            info!("{}{}", MSG_AUDIO_ROOT, store.root().display());
            store
        }
        Err(e) => {
            error!("{}{}: {}", ERR_AUDIO_ROOT, root.display(), e);
            process::exit(1);
        }
    }
}

/// Build the message registry, loading it from the database when one is given
async fn setup_registry(database_path: Option<PathBuf>) -> ChatRegistry {
    let Some(db_path) = database_path else {
        info!("{}", MSG_IN_MEMORY);
        return ChatRegistry::new();
    };

    let pool = match init_db(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("{}{}", ERR_DATABASE_INIT, e);
            process::exit(1);
        }
    };
    info!("{}{}", MSG_DATABASE, db_path.display());

    match ChatRegistry::with_database(MessageDb::new(pool)).await {
        Ok(chat) => chat,
        Err(e) => {
            error!("{}{}", ERR_REGISTRY_LOAD, e);
            process::exit(1);
        }
    }
}

/// Bind the main and notify listeners
async fn setup_network(bind: IpAddr, port: u16, notify_port: u16) -> (TcpListener, TcpListener) {
    let addr = SocketAddr::new(bind, port);
    let main_listener = bind_or_exit(addr).await;
    info!("{}{}", MSG_LISTENING, addr);

    let notify_addr = SocketAddr::new(bind, notify_port);
    let notify_listener = bind_or_exit(notify_addr).await;
    info!("{}{}", MSG_NOTIFY_LISTENING, notify_addr);

    (main_listener, notify_listener)
}

async fn bind_or_exit(addr: SocketAddr) -> TcpListener {
    match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("{}{}: {}", ERR_BIND_FAILED, addr, e);
            process::exit(1);
        }
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C elsewhere)
async fn setup_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).expect(ERR_SIGNAL_SIGTERM);
        let mut sigint = signal(SignalKind::interrupt()).expect(ERR_SIGNAL_SIGINT);

        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect(ERR_SIGNAL_CTRLC);
    }
}
