use crate::connection::Connection;
use crate::frame::RtuFrame;
use crate::server::Context;
use crate::server::dispatcher::{Job, Request};
use crate::tcp::server::READ_SIZE;

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

async fn stopped(stop: &mut watch::Receiver<bool>) {
    // A dropped sender stops the worker as well
    let _ = stop.wait_for(|stop| *stop).await;
}

/// Read requests from a serial port until it ends or the server stops
///
/// Unlike a TCP connection, a corrupted frame only drops that frame.
pub(crate) async fn serve<R>(
    mut reader: R,
    connection: Arc<Connection>,
    context: Context,
    mut stop: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin,
{
    let info = connection.info();
    let mut buffer = [0u8; READ_SIZE];
    loop {
        let size = tokio::select! {
            _ = stopped(&mut stop) => {
                debug!("Stopping port worker of {}", info);
                break;
            }
            result = reader.read(&mut buffer) => match result {
                Ok(0) => {
                    debug!("Port {} reached end of stream", info);
                    break;
                }
                Ok(size) => size,
                Err(e) => {
                    warn!("Failed to read from {} [{}]", info, e);
                    break;
                }
            }
        };
        trace!("Received {:02X?} from {}", &buffer[..size], info);

        let frame = match RtuFrame::parse(&buffer[..size]) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping bad frame from {} [{}]", info, e);
                continue;
            }
        };
        let request = Request {
            connection: connection.clone(),
            frame: Box::new(frame),
        };
        // The dispatcher may be stuck writing to this port, stopping must not wait for it
        let sent = tokio::select! {
            _ = stopped(&mut stop) => {
                debug!("Stopping port worker of {}, request dropped", info);
                break;
            }
            result = context.requests.send(Job::Request(request)) => result,
        };
        if sent.is_err() {
            warn!("Dispatcher is gone, stopping port worker of {}", info);
            break;
        }
    }
    context.hooks.connection_closed(info);
}
