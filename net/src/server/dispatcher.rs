use crate::Exception;
use crate::channel::Receiver;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::function::FunctionTable;
use crate::hooks::Hooks;

use memory::Memory;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, trace, warn};

/// Parsed request together with the connection it arrived on
pub(crate) struct Request {
    pub(crate) connection: Arc<Connection>,
    pub(crate) frame: Box<dyn Frame>,
}

pub(crate) type Access = Box<dyn FnOnce(&mut Memory) + Send + 'static>;

pub(crate) enum Job {
    Request(Request),
    /// Closure run against the memory, serialized with all requests
    Access(Access),
}

/// Single consumer of all requests
///
/// The dispatcher is the only owner of the memory. Handlers are executed one after the other, so
/// no request can observe a partially applied write of another one.
pub(crate) struct Dispatcher {
    memory: Memory,
    functions: Arc<RwLock<FunctionTable>>,
    hooks: Arc<Hooks>,
    receiver: Receiver<Job>,
}

impl Dispatcher {
    pub(crate) fn new(
        memory: Memory,
        functions: Arc<RwLock<FunctionTable>>,
        hooks: Arc<Hooks>,
        receiver: Receiver<Job>,
    ) -> Self {
        Self {
            memory,
            functions,
            hooks,
            receiver,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!("Request dispatcher started");
        while let Some(job) = self.receiver.recv().await {
            match job {
                Job::Request(request) => self.handle(request).await,
                Job::Access(access) => access(&mut self.memory),
            }
        }
        debug!("Request dispatcher stopped, all senders are gone");
    }

    async fn handle(&mut self, request: Request) {
        let Request { connection, frame } = request;
        let info = connection.info();

        self.hooks.request_received(info, frame.as_ref());

        let response = self.respond(frame.as_ref());
        match response.exception() {
            Some(exception) => debug!(
                "Function {:#04X} from {} failed with {}",
                frame.function(),
                info,
                exception
            ),
            None => trace!("Function {:#04X} from {} succeeded", frame.function(), info),
        }

        if let Err(e) = connection.write(&response.to_bytes()).await {
            warn!("Failed to write response to {} [{}]", info, e);
        }

        self.hooks.response_sent(info, response.as_ref());
    }

    fn respond(&mut self, frame: &dyn Frame) -> Box<dyn Frame> {
        let mut response = frame.reply();

        // The lock is released before the handler runs
        let handler = match self.functions.read() {
            Ok(table) => Ok(table.get(frame.function())),
            Err(e) => {
                error!("Function table is poisoned [{}]", e);
                Err(Exception::SlaveDeviceFailure)
            }
        };

        let result = match handler {
            Ok(Some(handler)) => handler(&mut self.memory, frame),
            Ok(None) => Err(Exception::IllegalFunction),
            Err(exception) => Err(exception),
        };

        match result {
            Ok(data) => response.set_data(data),
            Err(exception) => response.set_exception(exception),
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::{Dispatcher, Job, Request};
    use crate::Exception;
    use crate::channel::rendezvous;
    use crate::connection::{Connection, ConnectionInfo, Peer};
    use crate::frame::{Frame, TcpFrame};
    use crate::function::FunctionTable;
    use crate::hooks::Hooks;
    use memory::Memory;
    use std::sync::{Arc, RwLock};
    use tokio::io::AsyncReadExt;

    fn dispatcher(functions: FunctionTable) -> Dispatcher {
        let (_, receiver) = rendezvous();
        Dispatcher::new(
            Memory::default(),
            Arc::new(RwLock::new(functions)),
            Arc::new(Hooks::default()),
            receiver,
        )
    }

    #[test]
    fn ut_dispatcher_registered_function() {
        let mut functions = FunctionTable::empty();
        functions.register(0x41, |_, _| Ok(vec![0xCA, 0xFE]));
        let mut dispatcher = dispatcher(functions);

        let request = TcpFrame::new(9, 1, 0x41, vec![0x00]);
        let response = dispatcher.respond(&request);
        assert_eq!(response.function(), 0x41);
        assert_eq!(response.data(), &[0xCA, 0xFE]);
        assert_eq!(response.exception(), None);
    }

    #[test]
    fn ut_dispatcher_unregistered_function() {
        let mut dispatcher = dispatcher(FunctionTable::default());

        let request = TcpFrame::new(9, 1, 0x41, vec![0x01, 0x02]);
        let response = dispatcher.respond(&request);
        assert_eq!(response.function(), 0xC1);
        assert_eq!(response.exception(), Some(Exception::IllegalFunction));
        assert_eq!(
            response.to_bytes(),
            vec![0x00, 0x09, 0x00, 0x00, 0x00, 0x03, 0x01, 0xC1, 0x01]
        );
    }

    #[test]
    fn ut_dispatcher_function_replaced_at_runtime() {
        let functions = Arc::new(RwLock::new(FunctionTable::default()));
        let (_, receiver) = rendezvous();
        let mut dispatcher = Dispatcher::new(
            Memory::default(),
            functions.clone(),
            Arc::new(Hooks::default()),
            receiver,
        );

        let request = TcpFrame::new(1, 1, 0x06, vec![0x00, 0x0A, 0x12, 0x34]);
        assert_eq!(dispatcher.respond(&request).exception(), None);

        functions
            .write()
            .unwrap()
            .register(0x06, |_, _| Err(Exception::IllegalDataValue));
        assert_eq!(
            dispatcher.respond(&request).exception(),
            Some(Exception::IllegalDataValue)
        );
        assert_eq!(dispatcher.memory.holding_registers().get(10), Ok(0x1234));
    }

    #[tokio::test]
    async fn ut_dispatcher_writes_response() {
        let (sender, receiver) = rendezvous();
        let dispatcher = Dispatcher::new(
            Memory::default(),
            Arc::new(RwLock::new(FunctionTable::default())),
            Arc::new(Hooks::default()),
            receiver,
        );
        let task = tokio::spawn(dispatcher.run());

        let (mut client, server) = tokio::io::duplex(256);
        let connection = Arc::new(Connection::new(
            ConnectionInfo {
                id: 1,
                peer: Peer::Serial("test".to_owned()),
            },
            server,
        ));
        let frame = TcpFrame::new(5, 1, 0x06, vec![0x00, 0x0A, 0x12, 0x34]);
        let expected = frame.to_bytes();
        sender
            .send(Job::Request(Request {
                connection,
                frame: Box::new(frame),
            }))
            .await
            .ok()
            .unwrap();

        let mut buffer = vec![0u8; expected.len()];
        client.read_exact(&mut buffer).await.unwrap();
        assert_eq!(buffer, expected);

        drop(sender);
        task.await.unwrap();
    }
}
