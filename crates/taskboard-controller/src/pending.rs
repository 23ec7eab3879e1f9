use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use taskboard_core::{BoardError, BoardResult};
use tokio::task::JoinHandle;

/// Outcome of an engine operation whose remote half may still be running.
///
/// The optimistic change is already applied by the time a `Pending` is
/// handed out. Dropping it detaches the remote call; it is never cancelled.
pub struct Pending<T> {
    inner: Inner<T>,
}

enum Inner<T> {
    Ready(Option<BoardResult<T>>),
    Spawned(JoinHandle<BoardResult<T>>),
}

impl<T: 'static> Pending<T> {
    /// An operation that finished without leaving the local model.
    pub fn ready(result: BoardResult<T>) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    /// Run the remainder of an operation on the current `LocalSet`.
    pub fn spawn(future: impl Future<Output = BoardResult<T>> + 'static) -> Self {
        Self {
            inner: Inner::Spawned(tokio::task::spawn_local(future)),
        }
    }

    /// True when the operation completed synchronously, e.g. a no-op or a
    /// local rejection.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready(_))
    }

    /// Transform the successful value. Stays synchronous when `self` is.
    pub fn map<U: 'static>(self, f: impl FnOnce(T) -> U + 'static) -> Pending<U> {
        match self.inner {
            Inner::Ready(Some(result)) => Pending::ready(result.map(f)),
            Inner::Ready(None) => Pending::ready(Err(BoardError::Internal(
                "operation result already taken".into(),
            ))),
            Inner::Spawned(handle) => Pending::spawn(async move {
                let pending = Pending {
                    inner: Inner::Spawned(handle),
                };
                pending.await.map(f)
            }),
        }
    }
}

impl<T> Unpin for Pending<T> {}

impl<T> Future for Pending<T> {
    type Output = BoardResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Ready(result) => Poll::Ready(result.take().unwrap_or_else(|| {
                Err(BoardError::Internal("operation result already taken".into()))
            })),
            Inner::Spawned(handle) => Pin::new(handle).poll(cx).map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(BoardError::Internal(format!("operation task failed: {}", e)))
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_resolves_immediately() {
        let pending = Pending::ready(Ok(7));
        assert!(pending.is_ready());
        assert_eq!(pending.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_spawned_runs_on_local_set() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let pending = Pending::spawn(async { Ok("done") });
                assert!(!pending.is_ready());
                assert_eq!(pending.await.unwrap(), "done");
            })
            .await;
    }

    #[tokio::test]
    async fn test_map_keeps_ready_results_synchronous() {
        let pending = Pending::ready(Ok(2)).map(|n| n * 10);
        assert!(pending.is_ready());
        assert_eq!(pending.await.unwrap(), 20);

        let failed: Pending<u32> = Pending::ready(Err(BoardError::ViewClosed));
        assert!(matches!(failed.map(|n| n + 1).await, Err(BoardError::ViewClosed)));
    }
}
