//! Stream combinators - combine-latest and merge.
//!
//! These are the two combination policies the composition engine is
//! parameterized over (see [`crate::config::ComposeConfig`]):
//!
//! - [`combine_latest`] - continuous-state semantics: the output waits until
//!   *every* constituent has emitted once, then re-emits the full tuple of
//!   current values whenever any constituent emits.
//! - [`merge_streams`] - discrete-event semantics: emissions from all
//!   constituents are interleaved into one stream as they arrive.
//!
//! Both are ordinary derived streams: their driving effect is owned by the
//! output stream and stops when the last clone of the output is dropped.

use std::cell::Cell;

use spark_signals::{effect, effect_scope};

use super::event::{EventStream, ScopeGuard};

// =============================================================================
// Combine Latest
// =============================================================================

/// Combine a list of streams into a stream of value tuples.
///
/// The output emits once every constituent has emitted at least once, and
/// then again on every constituent emission. Combining zero streams yields
/// an immediately-emitting constant (one empty tuple), so the degenerate
/// case stays lawful.
pub fn combine_latest<T: Clone + 'static>(streams: Vec<EventStream<T>>) -> EventStream<Vec<T>> {
    let out: EventStream<Vec<T>> = EventStream::new();
    let scope = effect_scope(true);
    {
        let out = out.clone();
        scope.run(move || {
            let _stop = effect(move || {
                let mut values = Vec::with_capacity(streams.len());
                let mut ready = true;
                // Read every cell unconditionally so the effect depends on
                // all constituents, not just those before the first gap.
                for stream in &streams {
                    match stream.tracked_emission() {
                        Some(emission) => values.push(emission.value),
                        None => ready = false,
                    }
                }
                if ready {
                    out.emit(values);
                }
            });
        });
    }
    out.with_guard(ScopeGuard::new(move || scope.stop()))
}

// =============================================================================
// Merge
// =============================================================================

/// Interleave a list of streams into one.
///
/// Every emission of every constituent is forwarded exactly once. When
/// several constituents are ready within one reaction, their values are
/// forwarded in constituent-list order. Constituents that emitted before
/// the merge was built have their current value forwarded once.
pub fn merge_streams<T: Clone + 'static>(streams: Vec<EventStream<T>>) -> EventStream<T> {
    let out: EventStream<T> = EventStream::new();
    let scope = effect_scope(true);
    {
        let out = out.clone();
        let seen: Vec<Cell<u64>> = streams.iter().map(|_| Cell::new(0)).collect();
        scope.run(move || {
            let _stop = effect(move || {
                for (stream, last) in streams.iter().zip(&seen) {
                    if let Some(emission) = stream.tracked_emission() {
                        if emission.seq > last.get() {
                            last.set(emission.seq);
                            out.emit(emission.value);
                        }
                    }
                }
            });
        });
    }
    out.with_guard(ScopeGuard::new(move || scope.stop()))
}

// =============================================================================
// Tests
// =============================================================================
