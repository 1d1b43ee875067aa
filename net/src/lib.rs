//! Modbus responder engine
//!
//! Requests of all TCP connections and serial ports are funneled through a single dispatcher
//! which owns the memory banks and applies the function handlers one request at a time.

pub mod channel;
mod connection;
mod error;
mod exception;
pub mod frame;
pub mod function;
mod hooks;
pub mod rtu;
mod server;
pub mod tcp;

pub use connection::{ConnectionInfo, ListenerInfo, Peer};
pub use error::{Error, FrameError};
pub use exception::Exception;
pub use frame::{Frame, RtuFrame, TcpFrame};
pub use function::{FunctionTable, Handler};
pub use hooks::Hooks;
pub use memory::Memory;
pub use server::{Server, ServerBuilder};
