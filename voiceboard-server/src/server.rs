//! Accept loops for the main and notify listeners

use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error};

use crate::constants::{ERR_ACCEPT, TCP_KEEPALIVE_TIME};
use crate::dispatcher::handle_main_connection;
use crate::notify::handle_notify_connection;
use crate::state::ServerState;

/// Serve both listeners until the returned future is dropped
///
/// Every accepted socket gets its own task; a failing connection never
/// stops either loop.
pub async fn serve(main_listener: TcpListener, notify_listener: TcpListener, state: ServerState) {
    tokio::join!(
        accept_main(main_listener, state.clone()),
        accept_notify(notify_listener, state),
    );
}

async fn accept_main(listener: TcpListener, state: ServerState) {
    loop {
        match listener.accept().await {
            Ok((socket, peer_addr)) => {
                configure_socket(&socket);
                tokio::spawn(handle_main_connection(socket, peer_addr, state.clone()));
            }
            Err(e) => {
                error!("{}{}", ERR_ACCEPT, e);
            }
        }
    }
}

async fn accept_notify(listener: TcpListener, state: ServerState) {
    loop {
        match listener.accept().await {
            Ok((socket, peer_addr)) => {
                configure_socket(&socket);
                tokio::spawn(handle_notify_connection(socket, peer_addr, state.clone()));
            }
            Err(e) => {
                error!("{}{}", ERR_ACCEPT, e);
            }
        }
    }
}

/// Disable Nagle and enable keepalive on an accepted socket
fn configure_socket(socket: &TcpStream) {
    if let Err(e) = socket.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }

    let keepalive = TcpKeepalive::new().with_time(TCP_KEEPALIVE_TIME);
    if let Err(e) = SockRef::from(socket).set_tcp_keepalive(&keepalive) {
        debug!(error = %e, "failed to enable TCP keepalive");
    }
}
