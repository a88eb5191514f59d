//! Concurrent lazy sequence of stores (spec §3 "Stream of stores", §4.2).
//!
//! The teacher's `stream.rs` is a single-threaded trampoline built from a
//! `Lazy<Bind, MPlus, Pause, Delay>` tree that a `StreamEngine::step` drives
//! to normal form one node at a time. Spec.md §4.2 and §5 instead require a
//! *concurrent* stream with independent producer and consumer tasks, a
//! non-blocking `take`, and cooperative cancellation — so this module keeps
//! the teacher's two-kind split (an eager, already-running producer vs. a
//! lazy, deferred one) but backs the eager kind with a real channel
//! (`crossbeam_channel`, as used by `inputlayer-inputlayer` for its
//! dataflow worker communication) instead of a recursive `step` function.
use crate::error::{CancellationToken, Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Mutex;

/// Default bounded channel capacity for an `EagerStream`'s back-pressure.
pub const DEFAULT_BUFFER: usize = 64;

pub trait Stream<T: Clone + Send + 'static>: Send + Sync {
    /// Returns up to `n` items, a conservative `hasMore` hint, and an error
    /// only on cancellation (spec §4.2).
    fn take(&self, ctx: &CancellationToken, n: usize) -> Result<(Vec<T>, bool)>;

    /// Pushes an item; a no-op on a closed stream.
    fn put(&self, item: T);

    /// Idempotent.
    fn close(&self);

    fn count(&self) -> usize;
}

/// A channel-backed stream with concurrent producers and consumers.
pub struct EagerStream<T: Clone + Send + 'static> {
    tx: Mutex<Option<Sender<T>>>,
    rx: Receiver<T>,
    produced: std::sync::atomic::AtomicUsize,
}

impl<T: Clone + Send + 'static> EagerStream<T> {
    pub fn new(buffer: usize) -> (EagerStream<T>, Sender<T>) {
        let (tx, rx) = bounded(buffer.max(1));
        let stream = EagerStream {
            tx: Mutex::new(Some(tx.clone())),
            rx,
            produced: std::sync::atomic::AtomicUsize::new(0),
        };
        (stream, tx)
    }
}

impl<T: Clone + Send + 'static> Stream<T> for EagerStream<T> {
    fn take(&self, ctx: &CancellationToken, n: usize) -> Result<(Vec<T>, bool)> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            ctx.check()?;
            match self.rx.try_recv() {
                Ok(item) => {
                    self.produced.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    out.push(item);
                }
                Err(crossbeam_channel::TryRecvError::Empty) => {
                    // Block briefly for the next item, still cancellation-aware.
                    match self.rx.recv_timeout(std::time::Duration::from_millis(20)) {
                        Ok(item) => {
                            self.produced.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                            out.push(item);
                        }
                        Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                            if out.is_empty() {
                                continue;
                            } else {
                                // Conservative hasMore: the channel could not be
                                // peeked without blocking (spec §9 open question).
                                return Ok((out, true));
                            }
                        }
                        Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                            return Ok((out, false));
                        }
                    }
                }
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    return Ok((out, false));
                }
            }
        }
        // We filled the request; optimistically report more may be pending.
        let has_more = !self.rx.is_empty() || self.tx.lock().unwrap().is_some();
        Ok((out, has_more))
    }

    fn put(&self, item: T) {
        if let Some(tx) = self.tx.lock().unwrap().as_ref() {
            let _ = tx.send(item);
        }
    }

    fn close(&self) {
        self.tx.lock().unwrap().take();
    }

    fn count(&self) -> usize {
        self.produced.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// A stream that defers production to a callable and caches the result on
/// first `take`. Matches the teacher's `Lazy::Delay` node, generalized into
/// its own addressable stream kind per spec §4.2's "two required variants".
pub struct LazyStream<T: Clone + Send + 'static> {
    inner: Mutex<LazyState<T>>,
}

enum LazyState<T> {
    Pending(Option<Box<dyn FnOnce() -> Vec<T> + Send>>),
    Done(Vec<T>, usize),
    Closed,
}

impl<T: Clone + Send + 'static> LazyStream<T> {
    pub fn new<F>(producer: F) -> LazyStream<T>
    where
        F: FnOnce() -> Vec<T> + Send + 'static,
    {
        LazyStream {
            inner: Mutex::new(LazyState::Pending(Some(Box::new(producer)))),
        }
    }

    fn force(&self) {
        let mut guard = self.inner.lock().unwrap();
        if let LazyState::Pending(f) = &mut *guard {
            let f = f.take().expect("lazy stream producer already taken");
            let items = f();
            *guard = LazyState::Done(items, 0);
        }
    }
}

impl<T: Clone + Send + 'static> Stream<T> for LazyStream<T> {
    fn take(&self, ctx: &CancellationToken, n: usize) -> Result<(Vec<T>, bool)> {
        ctx.check()?;
        self.force();
        let mut guard = self.inner.lock().unwrap();
        match &mut *guard {
            LazyState::Done(items, cursor) => {
                let end = (*cursor + n).min(items.len());
                let out = items[*cursor..end].to_vec();
                *cursor = end;
                let has_more = *cursor < items.len();
                Ok((out, has_more))
            }
            LazyState::Closed => Ok((Vec::new(), false)),
            LazyState::Pending(_) => unreachable!("force() always resolves Pending"),
        }
    }

    /// Pushing into an already-materialized lazy stream is unsupported
    /// (spec §7 error kind 6); pushing before it has been forced is also
    /// not meaningful since the producer closure owns production.
    fn put(&self, _item: T) {
        // Silently ignored, matching the "put on closed stream is a no-op"
        // contract extended to the lazy variant (spec §4.2).
    }

    fn close(&self) {
        let mut guard = self.inner.lock().unwrap();
        *guard = LazyState::Closed;
    }

    fn count(&self) -> usize {
        match &*self.inner.lock().unwrap() {
            LazyState::Done(items, _) => items.len(),
            _ => 0,
        }
    }
}

pub fn unsupported_put<T>() -> Result<T> {
    Err(Error::Unsupported("put is not supported on this stream".into()))
}

/// Lets a producer thread hold one handle to close a stream while an
/// `Arc`-wrapped clone of the same handle is returned to the consumer as a
/// `Box<dyn Stream<T>>` (spec §4.3's goals spawn their own producer tasks).
impl<T: Clone + Send + 'static, S: Stream<T> + ?Sized> Stream<T> for std::sync::Arc<S> {
    fn take(&self, ctx: &CancellationToken, n: usize) -> Result<(Vec<T>, bool)> {
        (**self).take(ctx, n)
    }

    fn put(&self, item: T) {
        (**self).put(item)
    }

    fn close(&self) {
        (**self).close()
    }

    fn count(&self) -> usize {
        (**self).count()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eager_stream_round_trip() {
        let (stream, tx) = EagerStream::<i32>::new(DEFAULT_BUFFER);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        drop(tx);
        let ctx = CancellationToken::new();
        let (items, has_more) = stream.take(&ctx, 10).unwrap();
        assert_eq!(items, vec![1, 2]);
        assert!(!has_more);
    }

    #[test]
    fn lazy_stream_materializes_once() {
        let stream = LazyStream::new(|| vec![1, 2, 3]);
        let ctx = CancellationToken::new();
        let (first, has_more) = stream.take(&ctx, 2).unwrap();
        assert_eq!(first, vec![1, 2]);
        assert!(has_more);
        let (rest, has_more) = stream.take(&ctx, 10).unwrap();
        assert_eq!(rest, vec![3]);
        assert!(!has_more);
    }

    #[test]
    fn put_on_closed_stream_is_noop() {
        let (stream, tx) = EagerStream::<i32>::new(DEFAULT_BUFFER);
        stream.close();
        drop(tx);
        stream.put(1);
        let ctx = CancellationToken::new();
        let (items, has_more) = stream.take(&ctx, 1).unwrap();
        assert!(items.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn cancellation_surfaces_error() {
        let (stream, _tx) = EagerStream::<i32>::new(DEFAULT_BUFFER);
        let ctx = CancellationToken::new();
        ctx.cancel();
        assert!(stream.take(&ctx, 1).is_err());
    }
}
