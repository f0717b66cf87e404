//! EventStream - Discrete push streams over spark-signals.
//!
//! An `EventStream<T>` is a thin stream adapter on top of a reactive signal:
//! the signal cell holds the *last* emission (tagged with a per-stream
//! sequence number), so a stream doubles as a memory cell. Derived streams
//! ([`EventStream::map`], [`EventStream::filter_map`], the combinators in
//! [`super::combine`]) are driven by effects owned through a [`ScopeGuard`];
//! dropping the last clone of a derived stream stops its driving effect, so
//! teardown is purely structural - there is no explicit cancellation call.
//!
//! # Example
//!
//! ```ignore
//! use trellis::stream::EventStream;
//!
//! let numbers: EventStream<i64> = EventStream::new();
//! let doubled = numbers.map(|n| n * 2);
//!
//! numbers.emit(21);
//! assert_eq!(doubled.snapshot(), Some(42));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{effect, effect_scope, signal, Signal};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function for stopping a reactive subscription.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Scope Guard
// =============================================================================

/// Stops an effect scope when the last owner drops it.
///
/// Derived streams hold one of these so their driving effect lives exactly
/// as long as some clone of the stream is reachable.
pub(crate) struct ScopeGuard {
    stop: RefCell<Option<Cleanup>>,
}

impl ScopeGuard {
    pub(crate) fn new(stop: impl FnOnce() + 'static) -> Rc<Self> {
        Rc::new(Self {
            stop: RefCell::new(Some(Box::new(stop))),
        })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.borrow_mut().take() {
            stop();
        }
    }
}

// =============================================================================
// Emission
// =============================================================================

/// One emission: a value tagged with the stream's sequence number.
///
/// Equality is by sequence number only. Re-emitting an equal value still
/// bumps the sequence, so downstream effects observe every emission even
/// when the payload compares equal.
#[derive(Clone)]
pub(crate) struct Emission<T> {
    pub(crate) seq: u64,
    pub(crate) value: T,
}

impl<T> PartialEq for Emission<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

// =============================================================================
// EventStream
// =============================================================================

/// A discrete stream of values with last-value memory.
///
/// Clones share the same underlying cell: emitting on any clone is observed
/// by every reader. Identity (see [`EventStream::same_stream`]) follows the
/// shared cell, not the value.
pub struct EventStream<T: Clone + 'static> {
    cell: Signal<Option<Emission<T>>>,
    /// Untracked mirror of `cell`, for reads that must not register a
    /// reactive dependency (e.g. inspection from inside a driver effect).
    shadow: Rc<RefCell<Option<Emission<T>>>>,
    seq: Rc<Cell<u64>>,
    guards: Vec<Rc<ScopeGuard>>,
}

impl<T: Clone + 'static> std::fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            shadow: self.shadow.clone(),
            seq: self.seq.clone(),
            guards: self.guards.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> EventStream<T> {
    /// Create a stream that has not emitted yet.
    pub fn new() -> Self {
        Self {
            cell: signal(None),
            shadow: Rc::new(RefCell::new(None)),
            seq: Rc::new(Cell::new(0)),
            guards: Vec::new(),
        }
    }

    /// Create a stream that has already emitted `value`.
    pub fn of(value: T) -> Self {
        let stream = Self::new();
        stream.emit(value);
        stream
    }

    /// Create a stream that never emits.
    pub fn never() -> Self {
        Self::new()
    }

    /// Emit a value. Every reactive reader re-runs synchronously.
    pub fn emit(&self, value: T) {
        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        let emission = Emission { seq, value };
        // Shadow first, so untracked readers triggered by the cell write
        // already see the new emission.
        *self.shadow.borrow_mut() = Some(emission.clone());
        self.cell.set(Some(emission));
    }

    /// Last emitted value, if any. Registers a reactive dependency when
    /// called inside an effect.
    pub fn snapshot(&self) -> Option<T> {
        self.cell.get().map(|emission| emission.value)
    }

    /// Last emitted value without registering a reactive dependency.
    pub fn snapshot_untracked(&self) -> Option<T> {
        self.shadow.borrow().as_ref().map(|e| e.value.clone())
    }

    /// Whether this stream has emitted at least once (untracked).
    pub fn has_emitted(&self) -> bool {
        self.shadow.borrow().is_some()
    }

    /// Two handles observe the same underlying stream.
    pub fn same_stream(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.seq, &other.seq)
    }

    /// Tracked read of the full emission record (sequence + value).
    pub(crate) fn tracked_emission(&self) -> Option<Emission<T>> {
        self.cell.get()
    }

    /// Sequence number of the last emission (untracked); 0 if none.
    pub(crate) fn last_seq_untracked(&self) -> u64 {
        self.shadow.borrow().as_ref().map_or(0, |e| e.seq)
    }

    /// Attach a guard, tying a driving effect's lifetime to this stream.
    pub(crate) fn with_guard(mut self, guard: Rc<ScopeGuard>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Derived stream applying `f` to every emission.
    ///
    /// If the source has already emitted, the current value is forwarded
    /// immediately (memory semantics, like every derived stream here).
    pub fn map<U: Clone + 'static>(&self, mut f: impl FnMut(&T) -> U + 'static) -> EventStream<U> {
        self.filter_map(move |value| Some(f(value)))
    }

    /// Derived stream applying `f` and dropping `None` results.
    pub fn filter_map<U: Clone + 'static>(
        &self,
        mut f: impl FnMut(&T) -> Option<U> + 'static,
    ) -> EventStream<U> {
        let out = EventStream::new();
        let scope = effect_scope(true);
        {
            let source = self.clone();
            let out = out.clone();
            let seen = Cell::new(0u64);
            scope.run(move || {
                let _stop = effect(move || {
                    if let Some(emission) = source.tracked_emission() {
                        if emission.seq > seen.get() {
                            seen.set(emission.seq);
                            if let Some(mapped) = f(&emission.value) {
                                out.emit(mapped);
                            }
                        }
                    }
                });
            });
        }
        out.with_guard(ScopeGuard::new(move || scope.stop()))
    }

    /// Forward every emission (including the current one, if any) into
    /// `target`. The forwarding effect is registered with the caller's
    /// current effect scope; stopping that scope stops the forwarding.
    pub(crate) fn forward_into(&self, target: &EventStream<T>) {
        let source = self.clone();
        let target = target.clone();
        let seen = Cell::new(0u64);
        let _stop = effect(move || {
            if let Some(emission) = source.tracked_emission() {
                if emission.seq > seen.get() {
                    seen.set(emission.seq);
                    target.emit(emission.value.clone());
                }
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_snapshot() {
        let stream: EventStream<i64> = EventStream::new();
        assert_eq!(stream.snapshot(), None);
        assert!(!stream.has_emitted());

        stream.emit(1);
        assert_eq!(stream.snapshot(), Some(1));
        assert_eq!(stream.snapshot_untracked(), Some(1));

        stream.emit(2);
        assert_eq!(stream.snapshot(), Some(2));
    }

    #[test]
    fn test_of_emits_immediately() {
        let stream = EventStream::of("hello".to_string());
        assert_eq!(stream.snapshot(), Some("hello".to_string()));
    }

    #[test]
    fn test_clones_share_cell() {
        let a: EventStream<u32> = EventStream::new();
        let b = a.clone();
        a.emit(7);
        assert_eq!(b.snapshot(), Some(7));
        assert!(a.same_stream(&b));
        assert!(!a.same_stream(&EventStream::new()));
    }

    #[test]
    fn test_map_forwards_current_and_new() {
        let numbers = EventStream::of(10);
        let doubled = numbers.map(|n| n * 2);
        assert_eq!(doubled.snapshot(), Some(20));

        numbers.emit(21);
        assert_eq!(doubled.snapshot(), Some(42));
    }

    #[test]
    fn test_filter_map_drops_none() {
        let numbers: EventStream<i64> = EventStream::new();
        let odd = numbers.filter_map(|n| if n % 2 != 0 { Some(*n) } else { None });

        numbers.emit(2);
        assert_eq!(odd.snapshot(), None);
        numbers.emit(3);
        assert_eq!(odd.snapshot(), Some(3));
        numbers.emit(4);
        assert_eq!(odd.snapshot(), Some(3));
    }

    #[test]
    fn test_dropping_derived_stream_stops_it() {
        let numbers: EventStream<i64> = EventStream::new();
        let mapped = numbers.map(|n| n + 1);
        numbers.emit(1);
        assert_eq!(mapped.snapshot(), Some(2));

        drop(mapped);
        // No panic, and the source keeps working.
        numbers.emit(2);
        assert_eq!(numbers.snapshot(), Some(2));
    }

    #[test]
    fn test_reemission_bumps_sequence() {
        let stream: EventStream<i64> = EventStream::new();
        stream.emit(5);
        let first = stream.last_seq_untracked();
        stream.emit(5);
        assert!(stream.last_seq_untracked() > first);
    }
}
