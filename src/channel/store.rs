//! StateStore - a minimal reducer-folding state driver.
//!
//! The engine itself never owns state: components emit reducers on their
//! state sink, and something outside the composition has to fold those
//! reducers back into the ambient state stream. `StateStore` is that
//! something, kept deliberately small: hold the current value, apply each
//! incoming reducer, emit the new value.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use trellis::channel::StateStore;
//!
//! let store = StateStore::new(json!({ "count": 0 }));
//! let sources = trellis::channel::Sources::new().with_state(store.channel());
//!
//! let sinks = trellis::compose(tree, &sources)?;
//! if let Some(reducers) = sinks.channel("state") {
//!     store.drive(reducers.clone());
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{effect, effect_scope};

use crate::stream::EventStream;
use crate::stream::ScopeGuard;

use super::{SinkValue, StateChannel, StateValue};

/// Holds the current state and folds reducer emissions into it.
pub struct StateStore {
    current: Rc<RefCell<StateValue>>,
    stream: EventStream<StateValue>,
    guards: RefCell<Vec<Rc<ScopeGuard>>>,
}

impl StateStore {
    /// Create a store. The ambient stream emits `initial` immediately.
    pub fn new(initial: StateValue) -> Self {
        let stream = EventStream::of(initial.clone());
        Self {
            current: Rc::new(RefCell::new(initial)),
            stream,
            guards: RefCell::new(Vec::new()),
        }
    }

    /// The state channel to attach to [`super::Sources`].
    pub fn channel(&self) -> StateChannel {
        StateChannel::new(self.stream.clone())
    }

    /// Current state value.
    pub fn current(&self) -> StateValue {
        self.current.borrow().clone()
    }

    /// Apply every reducer emitted on `reducers` to the state, for as long
    /// as the store lives. Non-reducer payloads are dropped with a warning.
    pub fn drive(&self, reducers: EventStream<SinkValue>) {
        let scope = effect_scope(true);
        {
            let current = self.current.clone();
            let stream = self.stream.clone();
            let seen = std::cell::Cell::new(reducers.last_seq_untracked());
            scope.run(move || {
                let _stop = effect(move || {
                    if let Some(emission) = reducers.tracked_emission() {
                        if emission.seq > seen.get() {
                            seen.set(emission.seq);
                            match &emission.value {
                                SinkValue::Reducer(f) => {
                                    let previous = current.borrow().clone();
                                    let next = f(&previous);
                                    *current.borrow_mut() = next.clone();
                                    stream.emit(next);
                                }
                                other => {
                                    eprintln!(
                                        "[trellis StateStore] non-reducer payload on state \
                                        channel dropped: {other:?}"
                                    );
                                }
                            }
                        }
                    }
                });
            });
        }
        self.guards
            .borrow_mut()
            .push(ScopeGuard::new(move || scope.stop()));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initial_emission() {
        let store = StateStore::new(json!({ "count": 0 }));
        assert_eq!(store.channel().stream.snapshot(), Some(json!({ "count": 0 })));
    }

    #[test]
    fn test_reducers_fold_into_state() {
        let store = StateStore::new(json!({ "count": 0 }));
        let reducers: EventStream<SinkValue> = EventStream::new();
        store.drive(reducers.clone());

        reducers.emit(SinkValue::reducer(|prev| {
            let count = prev["count"].as_i64().unwrap_or(0);
            json!({ "count": count + 1 })
        }));
        assert_eq!(store.current(), json!({ "count": 1 }));

        reducers.emit(SinkValue::reducer(|prev| {
            let count = prev["count"].as_i64().unwrap_or(0);
            json!({ "count": count + 10 })
        }));
        assert_eq!(store.current(), json!({ "count": 11 }));
        assert_eq!(store.channel().stream.snapshot(), Some(json!({ "count": 11 })));
    }

    #[test]
    fn test_non_reducer_payload_is_dropped() {
        let store = StateStore::new(json!(0));
        let reducers: EventStream<SinkValue> = EventStream::new();
        store.drive(reducers.clone());

        reducers.emit(SinkValue::Value(json!("not a reducer")));
        assert_eq!(store.current(), json!(0));
    }

    #[test]
    fn test_reducers_emitted_before_drive_are_not_replayed() {
        let store = StateStore::new(json!(0));
        let reducers: EventStream<SinkValue> = EventStream::new();
        reducers.emit(SinkValue::reducer(|_| json!(99)));

        store.drive(reducers.clone());
        // The stale reducer is not applied retroactively.
        assert_eq!(store.current(), json!(0));

        reducers.emit(SinkValue::reducer(|_| json!(1)));
        assert_eq!(store.current(), json!(1));
    }
}
