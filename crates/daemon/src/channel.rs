//! Loopback UDP command channel.
//!
//! Text datagrams in, parsed [`ForceCommand`]s out. The protocol is
//! fire-and-forget: no acknowledgments, no replies, and anything that does
//! not parse is dropped without disturbing the control loop.

use classicwheel_controller::{ForceCommand, parse_command};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// Commands are a handful of bytes; anything bigger is truncated by the
/// kernel and will fail to parse, which is the right outcome.
const MAX_DATAGRAM: usize = 256;

/// Receive datagrams until the controller side of the channel goes away.
/// Socket receive errors are transient on UDP and never end the loop.
pub async fn listen(socket: UdpSocket, commands: mpsc::Sender<ForceCommand>) {
    if let Ok(addr) = socket.local_addr() {
        info!(%addr, "command channel listening");
    }

    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(error) => {
                debug!(error = %error, "datagram receive failed");
                continue;
            }
        };

        let Ok(text) = std::str::from_utf8(&buf[..len]) else {
            trace!(%peer, len, "ignoring non-utf8 datagram");
            continue;
        };

        match parse_command(text) {
            Some(command) => {
                trace!(%peer, ?command, "command received");
                if commands.send(command).await.is_err() {
                    debug!("controller gone, command channel closing");
                    break;
                }
            }
            None => trace!(%peer, message = text.trim(), "ignoring unrecognized message"),
        }
    }
}
