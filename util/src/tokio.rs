use async_trait::async_trait;
use futures_util::Future;
use std::sync::Arc;
use tokio::spawn as tokio_spawn;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[async_trait]
trait Joinable: Sync + Send {
    async fn join(&mut self);
}

#[async_trait]
impl<Output> Joinable for JoinHandle<Output>
where
    Output: Send + Sync + 'static,
{
    async fn join(&mut self) {
        if !JoinHandle::is_finished(self) {
            drop(self.await);
        }
    }
}

/// Group of background tasks that can be joined as a whole
///
/// Every task spawned through `TaskGroup::spawn()` is counted by the group until it has been
/// joined. `join_all()` acts as a barrier: it only returns once every task spawned before the
/// call has finished. Unlike a global context each group is owned by its creator, so independent
/// groups never wait on each other.
///
/// # Examples
///
/// ```rust
/// use util::tokio::TaskGroup;
///
/// #[tokio::main]
/// async fn main() {
///     let group = TaskGroup::default();
///     let (tx, rx) = tokio::sync::oneshot::channel();
///     group.spawn(async move {
///         let _ = tx.send(42);
///     }).await;
///
///     group.join_all().await;
///     assert_eq!(rx.await, Ok(42));
/// }
/// ```
#[derive(Default, Clone)]
pub struct TaskGroup {
    tasks: Arc<Mutex<Vec<Box<dyn Joinable>>>>,
}

impl TaskGroup {
    /// Spawn the given future as a tokio task and count it in this group
    pub async fn spawn<F>(&self, future: F)
    where
        F: Future + Send + 'static,
        <F as Future>::Output: Send + Sync + 'static,
    {
        let handle: JoinHandle<<F as Future>::Output> = tokio_spawn(future);
        self.tasks.lock().await.push(Box::new(handle));
    }

    /// Await every task of the group
    ///
    /// Tasks added while joining are awaited as well. The call does not guarantee that no more
    /// tasks are added after returning.
    pub async fn join_all(&self) {
        loop {
            let handles: Vec<_> = std::mem::take(&mut *self.tasks.lock().await);

            if handles.is_empty() {
                break;
            }

            for mut handle in handles {
                handle.join().await;
            }
        }
    }
}
