//! Asynchronous dispatcher and the write-once handle it returns.
//!
//! `Dispatcher::submit` hands a unit of work to the tokio runtime and returns
//! a `PendingCall` immediately. The runtime grows its capacity on demand and
//! reclaims idle blocking threads after their keep-alive elapses, so no fixed
//! upper bound is imposed. There is no ordering between submissions, no
//! cancellation, and no timeout.
//!
//! Each call owns a oneshot channel: the worker holds the only `Completer`,
//! the caller holds the only `PendingCall`. `Completer::complete` consumes
//! the completer, so a call is resolved at most once, and a completer that is
//! dropped unresolved (worker panic, runtime shutdown) resolves the call to a
//! transport failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use reflexian_core::ReflexianError;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::oneshot;

/// Outcome of one call.
pub type Outcome<T> = Result<T, ReflexianError>;

// ---------------------------------------------------------------------------
// Completer / PendingCall
// ---------------------------------------------------------------------------

/// Resolution side of a pending call. Owned by exactly one worker.
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<Outcome<T>>,
}

impl<T> Completer<T> {
    /// Resolve the call. Returns `false` if the caller already dropped its
    /// handle, in which case the outcome is discarded.
    pub fn complete(self, outcome: Outcome<T>) -> bool {
        self.tx.send(outcome).is_ok()
    }
}

/// Caller-side handle to an in-flight call.
///
/// Await it from async code, or call [`PendingCall::wait_blocking`] from a
/// thread outside the runtime.
#[derive(Debug)]
#[must_use = "a pending call does nothing unless its outcome is read"]
pub struct PendingCall<T> {
    state: State<T>,
}

#[derive(Debug)]
enum State<T> {
    Waiting(oneshot::Receiver<Outcome<T>>),
    Ready(Option<Outcome<T>>),
}

impl<T> PendingCall<T> {
    /// A fresh unresolved call and its completer.
    pub fn channel() -> (Completer<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            Completer { tx },
            Self {
                state: State::Waiting(rx),
            },
        )
    }

    /// A call that is already resolved to `err` and never reaches a worker.
    pub fn failed(err: ReflexianError) -> Self {
        Self {
            state: State::Ready(Some(Err(err))),
        }
    }

    /// Block the current thread until the call resolves.
    ///
    /// # Errors
    ///
    /// Returns the call's failure.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context, like
    /// `tokio::sync::oneshot::Receiver::blocking_recv`.
    pub fn wait_blocking(self) -> Outcome<T> {
        match self.state {
            State::Waiting(rx) => rx.blocking_recv().unwrap_or_else(|_| Err(abandoned())),
            State::Ready(outcome) => outcome.unwrap_or_else(|| Err(already_taken())),
        }
    }
}

// The outcome is moved out, never pinned.
impl<T> Unpin for PendingCall<T> {}

impl<T> Future for PendingCall<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match &mut this.state {
            State::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(result) => {
                    this.state = State::Ready(None);
                    Poll::Ready(result.unwrap_or_else(|_| Err(abandoned())))
                }
                Poll::Pending => Poll::Pending,
            },
            State::Ready(outcome) => Poll::Ready(outcome.take().unwrap_or_else(|| Err(already_taken()))),
        }
    }
}

fn abandoned() -> ReflexianError {
    ReflexianError::Transport(anyhow::anyhow!(
        "worker stopped before resolving the call"
    ))
}

fn already_taken() -> ReflexianError {
    ReflexianError::Transport(anyhow::anyhow!("pending call polled after completion"))
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs units of work off the caller's thread.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    runtime: Handle,
    in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter even if the work panics.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Dispatcher {
    /// Dispatch onto the given runtime.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Dispatch onto the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime.
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Calls submitted but not yet resolved.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run async `work` on its own task and return its handle immediately.
    pub fn submit<T, F>(&self, work: F) -> PendingCall<T>
    where
        T: Send + 'static,
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        let (completer, call) = PendingCall::channel();
        let guard = InFlightGuard::enter(&self.in_flight);
        self.runtime.spawn(async move {
            let outcome = work.await;
            drop(guard);
            if !completer.complete(outcome) {
                tracing::debug!("caller dropped pending call before it resolved");
            }
        });
        call
    }

    /// Run blocking `work` on the runtime's blocking pool.
    pub fn submit_blocking<T, F>(&self, work: F) -> PendingCall<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Outcome<T> + Send + 'static,
    {
        let (completer, call) = PendingCall::channel();
        let guard = InFlightGuard::enter(&self.in_flight);
        self.runtime.spawn_blocking(move || {
            let outcome = work();
            drop(guard);
            if !completer.complete(outcome) {
                tracing::debug!("caller dropped pending call before it resolved");
            }
        });
        call
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
