use super::Server;
use crate::Exception;
use crate::connection::{ConnectionInfo, ListenerInfo};
use crate::frame::Frame;
use crate::function::FunctionTable;
use crate::hooks::Hooks;

use memory::Memory;

/// Configure a `Server` before it starts serving
///
/// Hooks can only be registered here. Once `build()` is called they are frozen, so every hook sees
/// every event of the server's lifetime.
///
/// # Examples
///
/// ```rust
/// use net::{Exception, ServerBuilder};
///
/// #[tokio::main]
/// async fn main() {
///     let server = ServerBuilder::new()
///         .function(0x41, |_, _| Err(Exception::SlaveDeviceBusy))
///         .on_server_started(|info| println!("listening on {}", info.local_addr))
///         .build();
///     server.shutdown().await;
/// }
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    memory: Memory,
    functions: FunctionTable,
    hooks: Hooks,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory the dispatcher takes ownership of
    pub fn memory(mut self, memory: Memory) -> Self {
        self.memory = memory;
        self
    }

    pub fn function<F>(mut self, code: u8, handler: F) -> Self
    where
        F: Fn(&mut Memory, &dyn Frame) -> Result<Vec<u8>, Exception> + Send + Sync + 'static,
    {
        self.functions.register(code, handler);
        self
    }

    pub fn remove_function(mut self, code: u8) -> Self {
        self.functions.remove(code);
        self
    }

    pub fn on_connection_accepted<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConnectionInfo) + Send + Sync + 'static,
    {
        self.hooks.connection_accepted.push(Box::new(hook));
        self
    }

    pub fn on_connection_closed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConnectionInfo) + Send + Sync + 'static,
    {
        self.hooks.connection_closed.push(Box::new(hook));
        self
    }

    pub fn on_request_received<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConnectionInfo, &dyn Frame) + Send + Sync + 'static,
    {
        self.hooks.request_received.push(Box::new(hook));
        self
    }

    pub fn on_response_sent<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConnectionInfo, &dyn Frame) + Send + Sync + 'static,
    {
        self.hooks.response_sent.push(Box::new(hook));
        self
    }

    pub fn on_server_started<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ListenerInfo) + Send + Sync + 'static,
    {
        self.hooks.server_started.push(Box::new(hook));
        self
    }

    pub fn on_server_stopped<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ListenerInfo) + Send + Sync + 'static,
    {
        self.hooks.server_stopped.push(Box::new(hook));
        self
    }

    /// Spawn the dispatcher and return the running server
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> Server {
        Server::start(self.memory, self.functions, self.hooks)
    }
}
