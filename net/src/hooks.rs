use crate::connection::{ConnectionInfo, ListenerInfo};
use crate::frame::Frame;

pub type ConnectionHook = Box<dyn Fn(&ConnectionInfo) + Send + Sync + 'static>;
pub type FrameHook = Box<dyn Fn(&ConnectionInfo, &dyn Frame) + Send + Sync + 'static>;
pub type ListenerHook = Box<dyn Fn(&ListenerInfo) + Send + Sync + 'static>;

/// Ordered observer lists for the lifecycle events of a server
///
/// Hooks are collected by `ServerBuilder` and frozen once the server is built, so no hook can be
/// added while requests are processed. Each list is invoked synchronously in registration order.
/// A panicking hook is not caught and takes down the task that fired it.
#[derive(Default)]
pub struct Hooks {
    pub(crate) connection_accepted: Vec<ConnectionHook>,
    pub(crate) connection_closed: Vec<ConnectionHook>,
    pub(crate) request_received: Vec<FrameHook>,
    pub(crate) response_sent: Vec<FrameHook>,
    pub(crate) server_started: Vec<ListenerHook>,
    pub(crate) server_stopped: Vec<ListenerHook>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("connection_accepted", &self.connection_accepted.len())
            .field("connection_closed", &self.connection_closed.len())
            .field("request_received", &self.request_received.len())
            .field("response_sent", &self.response_sent.len())
            .field("server_started", &self.server_started.len())
            .field("server_stopped", &self.server_stopped.len())
            .finish()
    }
}

impl Hooks {
    pub(crate) fn connection_accepted(&self, info: &ConnectionInfo) {
        self.connection_accepted.iter().for_each(|hook| hook(info));
    }

    pub(crate) fn connection_closed(&self, info: &ConnectionInfo) {
        self.connection_closed.iter().for_each(|hook| hook(info));
    }

    pub(crate) fn request_received(&self, info: &ConnectionInfo, frame: &dyn Frame) {
        self.request_received
            .iter()
            .for_each(|hook| hook(info, frame));
    }

    pub(crate) fn response_sent(&self, info: &ConnectionInfo, frame: &dyn Frame) {
        self.response_sent.iter().for_each(|hook| hook(info, frame));
    }

    pub(crate) fn server_started(&self, info: &ListenerInfo) {
        self.server_started.iter().for_each(|hook| hook(info));
    }

    pub(crate) fn server_stopped(&self, info: &ListenerInfo) {
        self.server_stopped.iter().for_each(|hook| hook(info));
    }
}
