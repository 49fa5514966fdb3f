use std::sync::{Arc, Mutex};

use crate::error::PipelineError;

type Outcome<T> = Arc<Result<T, PipelineError>>;
type Callback<T> = Box<dyn FnOnce(&Result<T, PipelineError>) + Send>;

struct Inner<T> {
    outcome: Option<Outcome<T>>,
    callbacks: Vec<Callback<T>>,
}

impl<T> Default for Inner<T> {
    fn default() -> Self {
        Self { outcome: None, callbacks: Vec::new() }
    }
}

/// Single-slot, write-once result cell. Completing a promise runs every
/// callback registered on its future so far; callbacks registered after
/// completion run immediately (synchronously, on the caller's stack) --
/// see spec.md's "Promises with observer callbacks" design note.
pub struct Promise<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

/// The read side of a [`Promise`]. Cheap to clone; every clone observes the
/// same completion.
pub struct PromiseFuture<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for PromiseFuture<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> Promise<T> {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(Inner::default())) }
    }

    /// Builds a promise that's already resolved with `result`. Useful for
    /// collaborator implementations (like `TestChannel`) whose operations
    /// complete synchronously and still need to hand back a `Promise<T>`
    /// rather than only a future.
    pub fn completed(result: Result<T, PipelineError>) -> Self {
        let promise = Self::new();
        promise.inner.lock().unwrap().outcome = Some(Arc::new(result));
        promise
    }

    /// A future observing this promise's eventual completion.
    pub fn future(&self) -> PromiseFuture<T> {
        PromiseFuture { inner: self.inner.clone() }
    }

    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(self, err: PipelineError) {
        self.complete(Err(err));
    }

    /// Completes the promise with whichever of `result` the caller already
    /// has in hand (propagating an upstream error unchanged, for instance).
    pub fn complete(self, result: Result<T, PipelineError>) {
        let callbacks = {
            let mut guard = self.inner.lock().unwrap();
            if guard.outcome.is_some() {
                // Already completed. A promise is meant to be consumed by
                // value exactly once; a second completion is a caller bug
                // we swallow rather than panic on.
                return;
            }
            guard.outcome = Some(Arc::new(result));
            std::mem::take(&mut guard.callbacks)
        };
        let outcome = self.inner.lock().unwrap().outcome.clone().unwrap();
        for cb in callbacks {
            cb(&outcome);
        }
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PromiseFuture<T> {
    /// Registers `f` to run once the promise completes. If it already has,
    /// `f` runs synchronously before this call returns.
    pub fn on_complete<F>(&self, f: F)
    where
        F: FnOnce(&Result<T, PipelineError>) + Send + 'static,
    {
        let mut guard = self.inner.lock().unwrap();
        if let Some(outcome) = guard.outcome.clone() {
            drop(guard);
            f(&outcome);
        } else {
            guard.callbacks.push(Box::new(f));
        }
    }

    pub fn is_complete(&self) -> bool {
        self.inner.lock().unwrap().outcome.is_some()
    }
}
