use crate::connection::{Connection, ConnectionInfo, Peer};
use crate::frame::TcpFrame;
use crate::server::Context;
use crate::server::dispatcher::{Job, Request};

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, trace, warn};

/// Bytes read from a connection per call
pub(crate) const READ_SIZE: usize = 512;

/// Accept connections until the listener is closed
///
/// Every accepted connection is served by its own task which is not tracked afterwards.
pub(crate) async fn accept(
    listener: TcpListener,
    context: Context,
    mut close: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut close => {
                debug!("Closing listener");
                break;
            }
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    let info = ConnectionInfo {
                        id: context.next_id(),
                        peer: Peer::Tcp(peer),
                    };
                    debug!("Accepted connection {}", info);
                    context.hooks.connection_accepted(&info);

                    let (reader, writer) = stream.into_split();
                    let connection = Arc::new(Connection::new(info, writer));
                    tokio::spawn(serve(reader, connection, context.clone()));
                }
                Err(e) => {
                    error!(cause = %e, "Failed to accept connection");
                    break;
                }
            }
        }
    }
}

/// Read requests from a connection until it fails
///
/// A packet that is not a valid frame ends the connection without any response.
pub(crate) async fn serve<R>(mut reader: R, connection: Arc<Connection>, context: Context)
where
    R: AsyncRead + Unpin,
{
    let info = connection.info();
    let mut buffer = [0u8; READ_SIZE];
    loop {
        let size = match reader.read(&mut buffer).await {
            Ok(0) => {
                debug!("Connection {} closed by peer", info);
                break;
            }
            Ok(size) => size,
            Err(e) => {
                warn!("Failed to read from {} [{}]", info, e);
                break;
            }
        };
        trace!("Received {:02X?} from {}", &buffer[..size], info);

        let frame = match TcpFrame::parse(&buffer[..size]) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping connection {}, bad frame [{}]", info, e);
                break;
            }
        };
        let request = Request {
            connection: connection.clone(),
            frame: Box::new(frame),
        };
        if context.requests.send(Job::Request(request)).await.is_err() {
            warn!("Dispatcher is gone, dropping connection {}", info);
            break;
        }
    }

    if let Err(e) = connection.close().await {
        debug!("Failed to close {} [{}]", info, e);
    }
    context.hooks.connection_closed(info);
}
