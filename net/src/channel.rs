//! Zero-buffer handoff between many producers and a single consumer
//!
//! `Sender::send()` only completes once the receiver has taken the value out of the channel. A
//! value is never parked in the channel while the producer moves on, which gives all producers
//! the same backpressure as an unbuffered channel.

use tokio::sync::{mpsc, oneshot};

struct Handoff<T> {
    value: T,
    taken: oneshot::Sender<()>,
}

/// Error returned if the receiving side was dropped before it took the value
#[derive(Debug, PartialEq, Eq)]
pub struct SendError<T>(pub Option<T>);

impl<T> std::fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Receiver of the rendezvous channel is closed")
    }
}

pub struct Sender<T> {
    inner: mpsc::Sender<Handoff<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct Receiver<T> {
    inner: mpsc::Receiver<Handoff<T>>,
}

/// Create a rendezvous channel
pub fn rendezvous<T>() -> (Sender<T>, Receiver<T>) {
    let (sender, receiver) = mpsc::channel(1);
    (Sender { inner: sender }, Receiver { inner: receiver })
}

impl<T> Sender<T> {
    /// Hand the value over and wait until the receiver took it
    ///
    /// If the receiver is dropped before taking the value, the value is returned in the error
    /// when it is still available.
    pub async fn send(&self, value: T) -> Result<(), SendError<T>> {
        let (taken, confirmation) = oneshot::channel();
        self.inner
            .send(Handoff { value, taken })
            .await
            .map_err(|e| SendError(Some(e.0.value)))?;
        confirmation.await.map_err(|_| SendError(None))
    }
}

impl<T> Receiver<T> {
    /// Take the next value, `None` once all senders are gone
    pub async fn recv(&mut self) -> Option<T> {
        let Handoff { value, taken } = self.inner.recv().await?;
        // The producer may have given up waiting, nothing to confirm then
        let _ = taken.send(());
        Some(value)
    }
}
