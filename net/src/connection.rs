use std::fmt::Display;
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, watch};

/// Remote end of a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Peer {
    Tcp(SocketAddr),
    Serial(String),
}

impl Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Peer::Tcp(addr) => write!(f, "tcp://{}", addr),
            Peer::Serial(path) => write!(f, "serial://{}", path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionInfo {
    /// Identifier unique within one server
    pub id: u64,
    pub peer: Peer,
}

impl Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({})", self.id, self.peer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerInfo {
    pub local_addr: SocketAddr,
}

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Write side of an accepted connection or an opened serial port
///
/// Responses are written by the dispatcher while the read side stays with the worker that owns
/// the connection. Closing aborts a pending write, so a peer that stopped reading can not keep
/// the writer locked.
pub(crate) struct Connection {
    info: ConnectionInfo,
    writer: Mutex<Writer>,
    closed: watch::Sender<bool>,
}

async fn wait_closed(receiver: &mut watch::Receiver<bool>) {
    let _ = receiver.wait_for(|closed| *closed).await;
}

fn closed_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "Connection is closed")
}

impl Connection {
    pub(crate) fn new<W>(info: ConnectionInfo, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (closed, _) = watch::channel(false);
        Self {
            info,
            writer: Mutex::new(Box::new(writer)),
            closed,
        }
    }

    pub(crate) fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    pub(crate) async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut signal = self.closed.subscribe();
        let mut writer = tokio::select! {
            _ = wait_closed(&mut signal) => return Err(closed_error()),
            writer = self.writer.lock() => writer,
        };
        tokio::select! {
            _ = wait_closed(&mut signal) => Err(closed_error()),
            result = async {
                writer.write_all(bytes).await?;
                writer.flush().await
            } => result,
        }
    }

    /// Abort any pending write, then shut the writer down
    pub(crate) async fn close(&self) -> std::io::Result<()> {
        self.closed.send_replace(true);
        self.writer.lock().await.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::{Connection, ConnectionInfo, Peer};
    use std::io::ErrorKind;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn ut_connection_write_and_close() {
        let (client, server) = tokio::io::duplex(64);
        let info = ConnectionInfo {
            id: 3,
            peer: Peer::Serial("ttyTEST".to_owned()),
        };
        let connection = Connection::new(info.clone(), server);
        assert_eq!(connection.info(), &info);

        connection.write(&[1, 2, 3]).await.unwrap();
        connection.close().await.unwrap();

        let mut client = client;
        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn ut_connection_close_aborts_blocked_write() {
        // The peer never reads, so the write can not complete
        let (_client, server) = tokio::io::duplex(4);
        let info = ConnectionInfo {
            id: 4,
            peer: Peer::Serial("ttyTEST".to_owned()),
        };
        let connection = std::sync::Arc::new(Connection::new(info, server));

        let writer = tokio::spawn({
            let connection = connection.clone();
            async move { connection.write(&[0u8; 64]).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!writer.is_finished());

        tokio::time::timeout(Duration::from_secs(3), connection.close())
            .await
            .unwrap()
            .unwrap();
        let result = writer.await.unwrap();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::BrokenPipe);
        assert_eq!(
            connection.write(&[1]).await.unwrap_err().kind(),
            ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn ut_connection_info_display() {
        let info = ConnectionInfo {
            id: 1,
            peer: Peer::Tcp("127.0.0.1:502".parse().unwrap()),
        };
        assert_eq!(format!("{}", info), "#1 (tcp://127.0.0.1:502)");
    }
}
