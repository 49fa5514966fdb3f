//! Graceful shutdown coordinator (spec component E): lives alongside the
//! listener, tracks every accepted child connection, and completes a
//! shutdown future only once the listener has closed and every tracked
//! child has closed too.
//!
//! See `QuiescingHelper` for the state machine and `DESIGN.md` for how the
//! `UnusedQuiescingHelperError` drop-detection is wired given that
//! `initiate_shutdown` takes its promise as a parameter (spec.md §4.E).

mod error;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use conduit_pipeline::{Channel, PipelineError, Promise, PromiseFuture, safe_assert};

pub use error::QuiesceError;

/// Tri-state lifecycle spec.md's data model requires: no new listener is
/// accepted once `ShuttingDown`, and the listener always closes before any
/// child is signaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuiesceState {
    Running,
    ShuttingDown,
    ShutDown,
}

/// Delivers the quiesce signal to one tracked child. Implemented for any
/// `FnMut() + Send` closure below, so callers typically pass a closure that
/// fires `UserEvent::ChannelShouldQuiesce` on the child's own context rather
/// than implementing this by hand.
pub trait QuiesceSink: Send {
    fn should_quiesce(&mut self);
}

impl<F> QuiesceSink for F
where
    F: FnMut() + Send,
{
    fn should_quiesce(&mut self) {
        self();
    }
}

struct Inner<L: Channel> {
    state: QuiesceState,
    listener: L,
    children: HashMap<u64, Box<dyn QuiesceSink>>,
    next_child_id: u64,
    pending: Vec<Promise<()>>,
    internal_shutdown_promise: Option<Promise<()>>,
    internal_shutdown_future: PromiseFuture<()>,
}

/// Cheap-to-clone handle to the shutdown coordinator for one listener. Every
/// clone shares the same underlying state machine -- per spec.md §5 this is
/// the one object in the workspace meant to be reached from more than one
/// loop, so state transitions are serialized behind a mutex rather than
/// assumed single-threaded like every other handler here.
pub struct QuiescingHelper<L: Channel> {
    inner: Arc<Mutex<Inner<L>>>,
}

impl<L: Channel> Clone for QuiescingHelper<L> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<L: Channel + Send + 'static> QuiescingHelper<L> {
    pub fn new(listener: L) -> Self {
        let internal_shutdown_promise = Promise::new();
        let internal_shutdown_future = internal_shutdown_promise.future();
        let inner = Inner {
            state: QuiesceState::Running,
            listener,
            children: HashMap::new(),
            next_child_id: 0,
            pending: Vec::new(),
            internal_shutdown_promise: Some(internal_shutdown_promise),
            internal_shutdown_future,
        };
        Self { inner: Arc::new(Mutex::new(inner)) }
    }

    pub fn state(&self) -> QuiesceState {
        self.inner.lock().unwrap().state
    }

    pub fn tracked_child_count(&self) -> usize {
        self.inner.lock().unwrap().children.len()
    }

    /// A future that resolves once shutdown completes, regardless of which
    /// (if any) `initiate_shutdown` caller's promise you hold -- the one
    /// handle guaranteed to exist from construction, so `Drop`-detection
    /// (`UnusedQuiescingHelperError`) has something to fail.
    pub fn shutdown_future(&self) -> PromiseFuture<()> {
        self.inner.lock().unwrap().internal_shutdown_future.clone()
    }

    /// Registers a newly-accepted child. Past `Running`, the child receives
    /// its quiesce signal immediately (spec.md: "channels added thereafter
    /// also receive the event immediately"). Returns a guard that removes
    /// the child from tracking on drop (or explicit `mark_closed`) -- model
    /// this as the point where the application's own child-close logic
    /// reports back to the helper.
    pub fn track_child<S>(&self, sink: S) -> ChildGuard<L>
    where
        S: QuiesceSink + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_child_id;
        inner.next_child_id += 1;
        inner.children.insert(id, Box::new(sink));
        if inner.state != QuiesceState::Running {
            if let Some(sink) = inner.children.get_mut(&id) {
                sink.should_quiesce();
            }
        }
        drop(inner);
        ChildGuard { id, helper: self.clone(), closed: false }
    }

    /// Initiates shutdown. `ShutDown` already: succeeds `promise`
    /// immediately. `ShuttingDown` already: `promise` joins the others
    /// waiting on the same completion. `Running`: closes the listener
    /// first, then (once that completes) broadcasts the quiesce signal to
    /// every currently-tracked child.
    pub fn initiate_shutdown(&self, promise: Promise<()>) {
        let mut guard = self.inner.lock().unwrap();
        match guard.state {
            QuiesceState::ShutDown => {
                drop(guard);
                promise.succeed(());
            }
            QuiesceState::ShuttingDown => {
                guard.pending.push(promise);
            }
            QuiesceState::Running => {
                guard.pending.push(promise);
                guard.state = QuiesceState::ShuttingDown;
                let close_future = guard.listener.close().future();
                drop(guard);

                let inner = self.inner.clone();
                close_future.on_complete(move |result| match result {
                    Ok(()) => Self::on_listener_closed(&inner),
                    Err(err) => Self::fail_shutdown(&inner, err.to_string()),
                });
            }
        }
    }

    /// Child reported its close completed. Removes it from tracking; if
    /// this was the last tracked child and the listener has already closed,
    /// completes the shutdown.
    fn child_closed(&self, id: u64) {
        let mut guard = self.inner.lock().unwrap();
        guard.children.remove(&id);
        safe_assert!(!guard.children.contains_key(&id));
        if guard.state == QuiesceState::ShuttingDown && guard.children.is_empty() {
            Self::complete_shutdown(&mut guard);
        }
    }

    fn on_listener_closed(inner: &Arc<Mutex<Inner<L>>>) {
        let mut guard = inner.lock().unwrap();
        for sink in guard.children.values_mut() {
            sink.should_quiesce();
        }
        if guard.children.is_empty() {
            Self::complete_shutdown(&mut guard);
        }
    }

    fn complete_shutdown(guard: &mut Inner<L>) {
        guard.state = QuiesceState::ShutDown;
        if let Some(p) = guard.internal_shutdown_promise.take() {
            p.succeed(());
        }
        for p in guard.pending.drain(..) {
            p.succeed(());
        }
    }

    fn fail_shutdown(inner: &Arc<Mutex<Inner<L>>>, message: String) {
        let mut guard = inner.lock().unwrap();
        guard.state = QuiesceState::ShutDown;
        if let Some(p) = guard.internal_shutdown_promise.take() {
            p.fail(listener_close_failed(&message));
        }
        for p in guard.pending.drain(..) {
            p.fail(listener_close_failed(&message));
        }
    }
}

fn listener_close_failed(message: &str) -> PipelineError {
    Box::new(QuiesceError::ListenerCloseFailed(message.to_string()))
}

impl<L: Channel> Drop for QuiescingHelper<L> {
    fn drop(&mut self) {
        // Only the last handle dropping while still `Running` means nobody
        // will ever call `initiate_shutdown` on this listener.
        if Arc::strong_count(&self.inner) != 1 {
            return;
        }
        let Ok(mut guard) = self.inner.lock() else { return };
        if guard.state == QuiesceState::Running {
            if let Some(p) = guard.internal_shutdown_promise.take() {
                p.fail(Box::new(QuiesceError::UnusedQuiescingHelper));
            }
        }
    }
}

/// RAII handle returned by `track_child`. The application reports the
/// child's own close completing either by calling `mark_closed` explicitly
/// or simply by letting the guard drop once the child connection is torn
/// down.
pub struct ChildGuard<L: Channel> {
    id: u64,
    helper: QuiescingHelper<L>,
    closed: bool,
}

impl<L: Channel> ChildGuard<L> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mark_closed(mut self) {
        self.closed = true;
        self.helper.child_closed(self.id);
    }
}

impl<L: Channel> Drop for ChildGuard<L> {
    fn drop(&mut self) {
        if !self.closed {
            self.helper.child_closed(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use conduit_pipeline::TestChannel;

    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn listener() -> TestChannel {
        TestChannel::new(addr(1), addr(2))
    }

    #[test]
    fn quiesce_all_children_then_resolve() {
        let helper = QuiescingHelper::new(listener());
        let quiesced = Arc::new(AtomicUsize::new(0));

        let mut guards = Vec::new();
        for _ in 0..128 {
            let counter = quiesced.clone();
            guards.push(helper.track_child(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let shutdown_promise = Promise::new();
        let shutdown_future = shutdown_promise.future();
        helper.initiate_shutdown(shutdown_promise);

        assert_eq!(helper.state(), QuiesceState::ShuttingDown);
        assert_eq!(quiesced.load(Ordering::SeqCst), 128);
        assert!(!shutdown_future.is_complete());

        while let Some(guard) = guards.pop() {
            guard.mark_closed();
        }

        assert_eq!(helper.state(), QuiesceState::ShutDown);
        let mut resolved = false;
        shutdown_future.on_complete(move |r| resolved = r.is_ok());
        assert!(resolved);
    }

    #[test]
    fn children_added_after_shutdown_receives_the_event_immediately() {
        let helper = QuiescingHelper::new(listener());
        let promise = Promise::new();
        helper.initiate_shutdown(promise);

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let guard = helper.track_child(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        guard.mark_closed();
    }

    #[test]
    fn no_children_resolves_shutdown_as_soon_as_listener_closes() {
        let helper = QuiescingHelper::new(listener());
        let promise = Promise::new();
        let future = promise.future();
        helper.initiate_shutdown(promise);
        let mut resolved = false;
        future.on_complete(move |r| resolved = r.is_ok());
        assert!(resolved);
        assert_eq!(helper.state(), QuiesceState::ShutDown);
    }

    #[test]
    fn repeated_initiate_shutdown_after_shut_down_resolves_immediately() {
        let helper = QuiescingHelper::new(listener());
        helper.initiate_shutdown(Promise::new());
        assert_eq!(helper.state(), QuiesceState::ShutDown);

        let promise = Promise::new();
        let future = promise.future();
        helper.initiate_shutdown(promise);
        let mut resolved = false;
        future.on_complete(move |r| resolved = r.is_ok());
        assert!(resolved);
    }

    #[test]
    fn dropping_helper_while_running_fails_the_shutdown_future() {
        let helper = QuiescingHelper::new(listener());
        let future = helper.shutdown_future();
        drop(helper);
        let mut failed = false;
        future.on_complete(move |r| failed = r.is_err());
        assert!(failed);
    }

    #[test]
    fn dropping_one_clone_does_not_trip_unused_error() {
        let helper = QuiescingHelper::new(listener());
        let future = helper.shutdown_future();
        let clone = helper.clone();
        drop(helper);
        assert!(!future.is_complete());
        clone.initiate_shutdown(Promise::new());
        assert!(future.is_complete());
    }
}
