mod builder;
pub(crate) mod dispatcher;

pub use builder::ServerBuilder;

use crate::channel::{self, rendezvous};
use crate::connection::{Connection, ConnectionInfo, ListenerInfo, Peer};
use crate::frame::Frame;
use crate::function::{FunctionTable, Handler};
use crate::hooks::Hooks;
use crate::{Error, Exception, rtu, tcp};

use dispatcher::{Access, Dispatcher, Job};
use memory::Memory;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use util::tokio::TaskGroup;

/// Shared state handed to every listener and worker task
#[derive(Clone)]
pub(crate) struct Context {
    pub(crate) requests: channel::Sender<Job>,
    pub(crate) hooks: Arc<Hooks>,
    ids: Arc<AtomicU64>,
}

impl Context {
    pub(crate) fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed) + 1
    }
}

struct Listener {
    info: ListenerInfo,
    close: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Modbus responder serving any number of TCP listeners and serial ports
///
/// All requests of all transports are handed to one dispatcher task which exclusively owns the
/// memory banks. Use `ServerBuilder` to preset the memory, change the function table or register
/// hooks before the server starts.
pub struct Server {
    context: Context,
    functions: Arc<RwLock<FunctionTable>>,
    listeners: Mutex<Vec<Listener>>,
    ports: Mutex<Vec<Arc<Connection>>>,
    port_workers: TaskGroup,
    stop: watch::Sender<bool>,
}

impl Server {
    /// Server with zeroed memory and the built-in functions
    ///
    /// Must be called within a tokio runtime.
    pub fn new() -> Self {
        ServerBuilder::new().build()
    }

    pub(crate) fn start(memory: Memory, functions: FunctionTable, hooks: Hooks) -> Self {
        let (requests, receiver) = rendezvous();
        let functions = Arc::new(RwLock::new(functions));
        let hooks = Arc::new(hooks);
        tokio::spawn(Dispatcher::new(memory, functions.clone(), hooks.clone(), receiver).run());

        let (stop, _) = watch::channel(false);
        Self {
            context: Context {
                requests,
                hooks,
                ids: Arc::new(AtomicU64::new(0)),
            },
            functions,
            listeners: Mutex::new(Vec::new()),
            ports: Mutex::new(Vec::new()),
            port_workers: TaskGroup::default(),
            stop,
        }
    }

    /// Bind a TCP listener and start accepting connections
    ///
    /// Returns the bound local address, which differs from the given one if port 0 was used.
    pub async fn listen_tcp<A>(&self, address: A) -> Result<SocketAddr, Error>
    where
        A: ToSocketAddrs + Display,
    {
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| Error::Bind {
                address: address.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        let info = ListenerInfo { local_addr };

        self.context.hooks.server_started(&info);
        info!("Listening on tcp://{}", local_addr);

        let (close, closed) = oneshot::channel();
        let task = tokio::spawn(tcp::server::accept(listener, self.context.clone(), closed));
        self.listeners
            .lock()
            .await
            .push(Listener { info, close, task });
        Ok(local_addr)
    }

    /// Open the configured serial device and serve RTU requests on it
    pub async fn listen_rtu(&self, config: &rtu::Config) -> Result<ConnectionInfo, Error> {
        let stream = config.open()?;
        info!("Serving serial://{} at {} baud", config.path, config.baud_rate);
        Ok(self.serve_port(config.path.clone(), stream).await)
    }

    /// Serve RTU requests on an already opened byte stream
    ///
    /// The worker runs until the stream ends or `shutdown()` is called.
    pub async fn serve_port<S>(&self, name: impl Into<String>, stream: S) -> ConnectionInfo
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let info = ConnectionInfo {
            id: self.context.next_id(),
            peer: Peer::Serial(name.into()),
        };
        let connection = Arc::new(Connection::new(info.clone(), writer));
        self.ports.lock().await.push(connection.clone());

        self.context.hooks.connection_accepted(&info);
        self.port_workers
            .spawn(rtu::server::serve(
                reader,
                connection,
                self.context.clone(),
                self.stop.subscribe(),
            ))
            .await;
        info
    }

    /// Install or replace the handler of a function code
    ///
    /// Only requests dispatched after this call observe the change. Returns the replaced handler.
    pub fn register_function<F>(&self, code: u8, handler: F) -> Result<Option<Handler>, Error>
    where
        F: Fn(&mut Memory, &dyn Frame) -> Result<Vec<u8>, Exception> + Send + Sync + 'static,
    {
        let mut table = self
            .functions
            .write()
            .map_err(|e| Error::Lock(e.to_string()))?;
        debug!("Registering function {:#04X}", code);
        Ok(table.register(code, handler))
    }

    /// Remove the handler of a function code, later requests get an illegal function exception
    pub fn unregister_function(&self, code: u8) -> Result<Option<Handler>, Error> {
        let mut table = self
            .functions
            .write()
            .map_err(|e| Error::Lock(e.to_string()))?;
        debug!("Unregistering function {:#04X}", code);
        Ok(table.remove(code))
    }

    /// Run a closure on the memory banks, serialized with all requests
    pub async fn with_memory<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Memory) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result, receiver) = oneshot::channel();
        let access: Access = Box::new(move |memory| {
            let _ = result.send(f(memory));
        });
        self.context
            .requests
            .send(Job::Access(access))
            .await
            .map_err(|_| Error::DispatcherStopped)?;
        receiver.await.map_err(|_| Error::DispatcherStopped)
    }

    /// Stop all listeners and serial ports
    ///
    /// Listeners are closed one after the other, each one is gone once its server-stopped hooks
    /// fire. Afterwards all serial port workers are stopped and joined before their write halves
    /// are closed. Accepted TCP connections are left alone and end on their next failed read.
    pub async fn shutdown(&self) {
        let listeners = std::mem::take(&mut *self.listeners.lock().await);
        for Listener { info, close, task } in listeners {
            // The accept loop may already be gone after an accept error
            let _ = close.send(());
            if let Err(e) = task.await {
                error!(cause = %e, "Accept loop of tcp://{} failed", info.local_addr);
            }
            self.context.hooks.server_stopped(&info);
            info!("Stopped listening on tcp://{}", info.local_addr);
        }

        self.stop.send_replace(true);
        self.port_workers.join_all().await;

        let ports = std::mem::take(&mut *self.ports.lock().await);
        for port in ports {
            if let Err(e) = port.close().await {
                debug!("Failed to close {} [{}]", port.info(), e);
            }
        }
        info!("Server stopped");
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}
